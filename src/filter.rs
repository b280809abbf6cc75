//! Partial-match predicates over chunks and modules.

use crate::stats::{Chunk, Module};

/// Chunk selection. Both conditions must hold when present; an empty
/// filter matches every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFilter {
    /// Exact match against the stringified chunk id.
    pub chunk_id: Option<String>,
    /// Case-insensitive substring of any file the chunk emits.
    pub chunk_filename: Option<String>,
}

impl ChunkFilter {
    pub fn is_empty(&self) -> bool {
        self.chunk_id.is_none() && self.chunk_filename.is_none()
    }

    pub fn matches(&self, chunk: &Chunk) -> bool {
        if let Some(ref wanted) = self.chunk_id
            && chunk.id.as_ref().is_none_or(|id| id.to_string() != *wanted)
        {
            return false;
        }
        if let Some(ref needle) = self.chunk_filename {
            let needle = needle.to_lowercase();
            if !chunk
                .files
                .iter()
                .any(|file| file.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

/// Module selection by a case-insensitive substring of the module's
/// stringified id, its identifier, or its name. An empty filter matches
/// every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilter {
    pub module_name: Option<String>,
}

impl ModuleFilter {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: Some(module_name.into()),
        }
    }

    pub fn matches(&self, module: &Module) -> bool {
        let Some(ref needle) = self.module_name else {
            return true;
        };
        let needle = needle.to_lowercase();
        let id_matches = module
            .id
            .as_ref()
            .is_some_and(|id| id.to_string().to_lowercase().contains(&needle));
        let identifier_matches = module
            .identifier
            .as_ref()
            .is_some_and(|ident| ident.to_lowercase().contains(&needle));
        let name_matches = module
            .name
            .as_ref()
            .is_some_and(|name| name.to_lowercase().contains(&needle));
        id_matches || identifier_matches || name_matches
    }
}
