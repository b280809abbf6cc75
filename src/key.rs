//! Stable string identities for chunks, modules, entrypoints and assets.
//!
//! Every graph, filter and metric in the crate keys nodes through these
//! functions. Modules are keyed by their id when present and by their
//! identifier otherwise.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, RecordKind, Result};
use crate::stats::{Asset, Chunk, Id, Module, Reason};

const ENTRY_PREFIX: &str = "entry:";
const MODULE_PREFIX: &str = "module:";

/// Key of a node in a module/entry [`Graph`](crate::graph::Graph).
///
/// Entry and module keys live in separate spaces: an entrypoint named `"1"`
/// is never confused with module id `1`. The rendered form keeps them apart
/// too: entries print as `entry:<name>`, modules print raw unless the raw key
/// itself starts with one of the namespace prefixes, in which case it is
/// written as `module:<key>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Entry(String),
    Module(String),
}

impl NodeKey {
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::Entry(_))
    }

    /// The key without its namespace.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Entry(s) | Self::Module(s) => s,
        }
    }
}

fn is_prefixed(key: &str) -> bool {
    key.starts_with(ENTRY_PREFIX) || key.starts_with(MODULE_PREFIX)
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(name) => write!(f, "{ENTRY_PREFIX}{name}"),
            Self::Module(key) if is_prefixed(key) => write!(f, "{MODULE_PREFIX}{key}"),
            Self::Module(key) => f.write_str(key),
        }
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn chunk_key(chunk: &Chunk) -> Result<String> {
    chunk.id.as_ref().map(Id::to_string).ok_or_else(|| Error::MissingIdentity {
        kind: RecordKind::Chunk,
        detail: match chunk.names.first() {
            Some(name) => format!("chunk '{name}' has no id"),
            None => "chunk has no id".to_string(),
        },
    })
}

/// Key from the pair of module identity fields. Shared by modules and the
/// reasons that point at them so both sides derive keys identically.
pub fn module_key_from(id: Option<&Id>, identifier: Option<&str>) -> Result<NodeKey> {
    if let Some(id) = id {
        return Ok(NodeKey::Module(id.to_string()));
    }
    if let Some(identifier) = identifier {
        return Ok(NodeKey::Module(identifier.to_owned()));
    }
    Err(Error::MissingIdentity {
        kind: RecordKind::Module,
        detail: "module has neither an id nor an identifier".to_string(),
    })
}

pub fn module_key(module: &Module) -> Result<NodeKey> {
    module_key_from(module.id.as_ref(), module.identifier.as_deref()).map_err(|_| {
        Error::MissingIdentity {
            kind: RecordKind::Module,
            detail: match module.name.as_deref() {
                Some(name) => format!("module '{name}' has neither an id nor an identifier"),
                None => "module has neither an id nor an identifier".to_string(),
            },
        }
    })
}

pub fn entry_key(name: Option<&str>) -> Result<NodeKey> {
    name.map(|n| NodeKey::Entry(n.to_owned()))
        .ok_or_else(|| Error::MissingIdentity {
            kind: RecordKind::Entry,
            detail: "entry reason has no entrypoint name".to_string(),
        })
}

pub fn asset_key(asset: &Asset) -> &str {
    &asset.name
}

/// What a reason points at, with its key derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonTarget {
    Entry(NodeKey),
    /// Key by id (when present) plus the identifier, which lets a resolver
    /// fall back when the document keys that module differently.
    Module {
        key: NodeKey,
        identifier: Option<String>,
    },
}

/// Derive the key of the node a reason refers to. `Ok(None)` means the
/// reason names no node at all.
pub fn reason_target(reason: &Reason) -> Result<Option<ReasonTarget>> {
    if reason.is_entry() {
        return entry_key(reason.loc.as_deref()).map(|k| Some(ReasonTarget::Entry(k)));
    }
    if !reason.refers_to_module() {
        return Ok(None);
    }
    let key = module_key_from(reason.module_id.as_ref(), reason.module_identifier.as_deref())?;
    Ok(Some(ReasonTarget::Module {
        key,
        identifier: reason.module_identifier.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_stringifies_id() {
        let chunk = Chunk {
            id: Some(Id::Num(7)),
            ..Chunk::default()
        };
        assert_eq!(chunk_key(&chunk).unwrap(), "7");
    }

    #[test]
    fn chunk_without_id_is_missing_identity() {
        let chunk = Chunk {
            names: vec!["vendors".into()],
            ..Chunk::default()
        };
        let err = chunk_key(&chunk).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingIdentity {
                kind: RecordKind::Chunk,
                ..
            }
        ));
        assert!(err.to_string().contains("vendors"));
    }

    #[test]
    fn module_key_prefers_id() {
        let m = Module {
            id: Some(Id::Num(3)),
            identifier: Some("/src/a.js".into()),
            ..Module::default()
        };
        assert_eq!(module_key(&m).unwrap(), NodeKey::Module("3".into()));
    }

    #[test]
    fn module_key_falls_back_to_identifier() {
        let m = Module {
            identifier: Some("/src/a.js".into()),
            ..Module::default()
        };
        assert_eq!(module_key(&m).unwrap(), NodeKey::Module("/src/a.js".into()));
    }

    #[test]
    fn module_without_identity_fails() {
        let m = Module {
            name: Some("./a.js".into()),
            ..Module::default()
        };
        assert!(module_key(&m).unwrap_err().to_string().contains("./a.js"));
    }

    #[test]
    fn entry_and_module_keys_do_not_collide() {
        let entry = entry_key(Some("1")).unwrap();
        let module = module_key_from(Some(&Id::Num(1)), None).unwrap();
        assert_ne!(entry, module);
        assert_eq!(entry.to_string(), "entry:1");
        assert_eq!(module.to_string(), "1");
    }

    #[test]
    fn prefixed_module_keys_are_escaped() {
        let entry = entry_key(Some("main")).unwrap();
        let lookalike = NodeKey::Module("entry:main".into());
        let escaped = NodeKey::Module("module:x".into());
        assert_eq!(entry.to_string(), "entry:main");
        assert_eq!(lookalike.to_string(), "module:entry:main");
        assert_eq!(escaped.to_string(), "module:module:x");
        assert_eq!(NodeKey::Module("./entry:a.js".into()).to_string(), "./entry:a.js");
    }

    #[test]
    fn entry_key_requires_name() {
        assert!(entry_key(None).is_err());
    }

    #[test]
    fn reason_and_module_derive_the_same_key() {
        let m = Module {
            id: Some(Id::Str("abc".into())),
            identifier: Some("/src/abc.js".into()),
            ..Module::default()
        };
        let reason = Reason {
            module_id: Some(Id::Str("abc".into())),
            module_identifier: Some("/src/abc.js".into()),
            ..Reason::default()
        };
        let Some(ReasonTarget::Module { key, .. }) = reason_target(&reason).unwrap() else {
            panic!("expected a module target");
        };
        assert_eq!(key, module_key(&m).unwrap());
    }

    #[test]
    fn reason_without_module_has_no_target() {
        let reason = Reason {
            kind: Some("harmony side effect evaluation".into()),
            ..Reason::default()
        };
        assert_eq!(reason_target(&reason).unwrap(), None);
    }

    #[test]
    fn entry_reason_targets_entrypoint() {
        let reason = Reason {
            kind: Some("entry".into()),
            loc: Some("main".into()),
            ..Reason::default()
        };
        assert_eq!(
            reason_target(&reason).unwrap(),
            Some(ReasonTarget::Entry(NodeKey::Entry("main".into())))
        );
    }

    #[test]
    fn asset_key_is_file_name() {
        let asset = Asset {
            name: "main.js".into(),
            size: Some(10),
        };
        assert_eq!(asset_key(&asset), "main.js");
    }
}
