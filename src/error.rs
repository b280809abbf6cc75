//! Error types for statsgraph.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What kind of record was missing its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Chunk,
    Module,
    Entry,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Chunk => "chunk",
            Self::Module => "module",
            Self::Entry => "entrypoint",
        })
    }
}

/// Errors from loading a stats document, building graphs over it, and
/// rendering the result.
// Display: lowercase, no trailing punctuation, so it composes into
// larger error messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Cannot read the stats file from disk.
    #[error("cannot read stats file '{}': {source}", .path.display())]
    StatsRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Stats file is not valid JSON or does not match the stats schema.
    #[error("invalid stats file '{}': {source}", .path.display())]
    StatsParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The document lacks a top-level section the operation needs.
    #[error("stats document has no '{0}' section")]
    MissingInput(&'static str),
    /// A record has none of the fields its key is derived from.
    #[error("{kind} has no identity: {detail}")]
    MissingIdentity { kind: RecordKind, detail: String },
    /// A module lacks per-module data the build mode requires.
    #[error("module '{module}' is malformed: {problem}")]
    MalformedModule { module: String, problem: String },
    /// A reference that must resolve within the document does not.
    #[error("{from} refers to unknown {kind} '{target}'")]
    UnresolvedReference {
        from: String,
        kind: RecordKind,
        target: String,
    },
    /// An edge map points at a node that is not in the node map.
    #[error("graph edge points to node '{0}' which is not in the graph")]
    DanglingReference(String),
    /// The graph could not be rendered to the requested format.
    #[error("cannot render {format} output: {message}")]
    Render { format: String, message: String },
    /// Cannot write the rendered graph to disk.
    #[error("cannot write graph '{}': {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// User-facing hint to accompany the error message.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::StatsParse { .. } => {
                Some("expected the JSON written by `webpack --json` (or the stats plugin)")
            }
            Self::MissingInput("modules") => {
                Some("generate stats with modules enabled (`stats: { modules: true }`)")
            }
            Self::MissingInput("entrypoints") => {
                Some("generate stats with entrypoints enabled (`stats: { entrypoints: true }`)")
            }
            Self::MissingInput("chunks") => {
                Some("is this a stats document? it must contain a 'chunks' list")
            }
            Self::MalformedModule { .. } => Some(
                "generate stats with `stats: { reasons: true }`, or pass --allow-orphans",
            ),
            Self::DanglingReference(_) => Some("this is a bug in statsgraph, please report it"),
            Self::Render { .. } => {
                Some("install Graphviz (`dot`) or use --format dot to write the graph source")
            }
            _ => None,
        }
    }
}
