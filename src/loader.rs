//! Reading stats documents from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::stats::StatsDocument;

/// A parsed stats document and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedStats {
    pub document: StatsDocument,
    pub path: PathBuf,
}

/// Read, parse and sanity-check a stats file.
///
/// A document without a `chunks` list is rejected up front: every stats
/// document a bundler writes has one, so its absence means the file is
/// something else.
pub fn load_stats(path: &Path) -> Result<LoadedStats> {
    let start = Instant::now();
    let text = fs::read_to_string(path).map_err(|source| Error::StatsRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(bytes = text.len(), "read {}", path.display());

    let document = parse_stats(&text, path)?;
    info!(
        chunks = section_len(document.chunks.as_ref()),
        modules = section_len(document.modules.as_ref()),
        assets = section_len(document.assets.as_ref()),
        entrypoints = document.entrypoints.as_ref().map_or(0, |e| e.len()),
        elapsed_ms = start.elapsed().as_millis(),
        "loaded {}",
        path.display()
    );

    Ok(LoadedStats {
        document,
        path: path.to_path_buf(),
    })
}

/// Parse stats JSON. `path` is only used for error messages.
pub fn parse_stats(text: &str, path: &Path) -> Result<StatsDocument> {
    let document: StatsDocument = serde_json::from_str(text).map_err(|source| Error::StatsParse {
        path: path.to_path_buf(),
        source,
    })?;
    if document.chunks.is_none() {
        return Err(Error::MissingInput("chunks"));
    }
    Ok(document)
}

fn section_len<T>(section: Option<&Vec<T>>) -> usize {
    section.map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, r#"{"chunks":[],"modules":[]}"#).unwrap();

        let loaded = load_stats(&path).unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.document.modules.map(|m| m.len()), Some(0));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_stats(Path::new("/nonexistent/stats.json")).unwrap_err();
        assert!(matches!(err, Error::StatsRead { .. }));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_stats("{not json", Path::new("stats.json")).unwrap_err();
        assert!(matches!(err, Error::StatsParse { .. }));
        assert!(err.to_string().contains("stats.json"));
    }

    #[test]
    fn document_without_chunks_is_rejected() {
        let err = parse_stats(r#"{"modules":[]}"#, Path::new("stats.json")).unwrap_err();
        assert!(matches!(err, Error::MissingInput("chunks")));
    }
}
