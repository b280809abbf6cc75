#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Stats document for integration tests.
///
/// Structure:
///   entry "main" -> ./src/index.js (1)
///   ./src/index.js (1) -> ./src/a.js (2), ./src/b.js (3)
///   ./src/b.js (3) -> ./src/a.js (2)      (diamond: index->a, index->b->a)
///   ./src/a.js (2) -> lodash (4)
///   ./src/index.js (1) -> ./src/lazy.js (5) via import(), in chunk 1
///
/// Chunks: 0 "main" emits main.js; 1 "lazy" emits lazy.chunk.js, parent 0.
pub const STATS: &str = r#"{
    "version": "5.90.0",
    "hash": "f00d",
    "assets": [
        {"name": "main.js", "size": 71234},
        {"name": "lazy.chunk.js", "size": 512}
    ],
    "chunks": [
        {"id": 0, "names": ["main"], "files": ["main.js"], "parents": []},
        {"id": 1, "names": ["lazy"], "files": ["lazy.chunk.js"], "parents": [0]}
    ],
    "entrypoints": {
        "main": {"name": "main", "chunks": [0], "assets": [{"name": "main.js"}]}
    },
    "modules": [
        {"id": 1, "identifier": "/app/src/index.js", "name": "./src/index.js",
         "size": 100, "chunks": [0],
         "reasons": [{"type": "entry", "loc": "main"}]},
        {"id": 2, "identifier": "/app/src/a.js", "name": "./src/a.js",
         "size": 200, "chunks": [0],
         "reasons": [
            {"type": "harmony import", "moduleId": 1, "moduleIdentifier": "/app/src/index.js"},
            {"type": "harmony import", "moduleId": 3, "moduleIdentifier": "/app/src/b.js"}
         ]},
        {"id": 3, "identifier": "/app/src/b.js", "name": "./src/b.js",
         "size": 300, "chunks": [0],
         "reasons": [{"type": "harmony import", "moduleId": 1, "moduleIdentifier": "/app/src/index.js"}]},
        {"id": 4, "identifier": "/app/node_modules/lodash/lodash.js",
         "name": "./node_modules/lodash/lodash.js", "size": 70000, "chunks": [0],
         "reasons": [{"type": "cjs require", "moduleId": 2, "moduleIdentifier": "/app/src/a.js"}]},
        {"id": 5, "identifier": "/app/src/lazy.js", "name": "./src/lazy.js",
         "size": 50, "chunks": [1],
         "reasons": [{"type": "import()", "moduleId": 1, "moduleIdentifier": "/app/src/index.js"}]}
    ]
}"#;

/// A stats file on disk. Caller must keep the returned value alive
/// (dropping `TempDir` deletes the file).
pub struct TestStats {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl TestStats {
    pub fn new() -> Self {
        Self::with_contents(STATS)
    }

    pub fn with_contents(contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, contents).unwrap();
        Self { dir, path }
    }

    /// Same document with one JSON edit applied.
    pub fn modified(edit: impl FnOnce(&mut serde_json::Value)) -> Self {
        let mut value: serde_json::Value = serde_json::from_str(STATS).unwrap();
        edit(&mut value);
        Self::with_contents(&value.to_string())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// The three-module chain 1 -> 2 -> 3 with sizes 10, 20, 5.
pub fn chain_stats() -> statsgraph::stats::StatsDocument {
    serde_json::from_str(
        r#"{
        "chunks": [{"id": 0, "names": ["main"], "files": ["main.js"]}],
        "assets": [{"name": "main.js", "size": 35}],
        "entrypoints": {},
        "modules": [
            {"id": 1, "name": "a", "size": 10, "chunks": [0], "reasons": []},
            {"id": 2, "name": "b", "size": 20, "chunks": [0],
             "reasons": [{"type": "harmony import", "moduleId": 1}]},
            {"id": 3, "name": "c", "size": 5, "chunks": [0],
             "reasons": [{"type": "harmony import", "moduleId": 2}]}
        ]
    }"#,
    )
    .unwrap()
}
