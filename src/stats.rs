//! Data model of a bundler stats document.
//!
//! Only the fields the graphs are built from are modelled; everything else in
//! the document is ignored. Sections are optional because stats output is
//! configurable and each pipeline checks for the sections it needs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A chunk or module id. Bundlers emit either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(u64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub chunks: Option<Vec<Chunk>>,
    pub modules: Option<Vec<Module>>,
    pub assets: Option<Vec<Asset>>,
    pub entrypoints: Option<BTreeMap<String, ChunkGroup>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Option<Id>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub parents: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Option<Id>,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    #[serde(default)]
    pub chunks: Vec<Id>,
    /// `None` when the document was generated without reasons, which is
    /// different from a module with an empty reasons list.
    pub reasons: Option<Vec<Reason>>,
}

/// One recorded cause of a module's inclusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// For entry reasons, the name of the entrypoint.
    pub loc: Option<String>,
    pub module: Option<String>,
    pub module_id: Option<Id>,
    pub module_identifier: Option<String>,
    pub module_name: Option<String>,
}

impl Reason {
    /// Entry reasons point at an entrypoint rather than a module
    /// (`entry`, or `single entry` / `multi entry` in older bundlers).
    pub fn is_entry(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k == "entry" || k.ends_with(" entry"))
            && !self.refers_to_module()
    }

    /// Whether the reason names an including module at all.
    pub fn refers_to_module(&self) -> bool {
        self.module_id.is_some() || self.module_identifier.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub size: Option<u64>,
}

/// An entrypoint's chunk group. Asset entries vary between bundler versions
/// (plain file names or objects), so they are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkGroup {
    pub name: Option<String>,
    #[serde(default)]
    pub chunks: Vec<Id>,
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
}

impl Module {
    /// Human-readable label: the module name, else its identifier.
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().or(self.identifier.as_deref())
    }

    pub fn own_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}
