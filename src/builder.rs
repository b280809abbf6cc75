//! Graph construction from a stats document.
//!
//! Modules record *why* they were included as a list of reasons, each naming
//! the including module or entrypoint. [`build_module_graph`] turns those
//! back-references into a [`Graph`] with explicit edges from includer to
//! included. [`build_chunk_graph`] does the same for chunk parent lists.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::error::{Error, RecordKind, Result};
use crate::filter::ChunkFilter;
use crate::graph::{ChunkGraph, EntryNode, Graph, ModuleNode, Node};
use crate::key::{self, NodeKey, ReasonTarget};
use crate::stats::{Chunk, Module, StatsDocument};

/// How to treat modules whose inclusion reasons are missing or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasonPolicy {
    /// Every module must carry a reasons list and every non-entry reason
    /// must name a module. Violations fail with [`Error::MalformedModule`].
    Strict,
    /// Modules without reasons become roots and are reported as warnings.
    #[default]
    Tolerant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Add entrypoints as root nodes and resolve entry reasons to them.
    pub include_entries: bool,
    pub reasons: ReasonPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_entries: true,
            reasons: ReasonPolicy::Tolerant,
        }
    }
}

impl BuildOptions {
    /// Module-only graph that requires every module to explain itself.
    pub fn strict_modules() -> Self {
        Self {
            include_entries: false,
            reasons: ReasonPolicy::Strict,
        }
    }
}

/// Non-fatal findings from a build.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildWarning {
    /// Module has no reasons list; it was kept as a root.
    OrphanModule { module: NodeKey, name: Option<String> },
    /// A reason names a node that is not in the document's module set.
    UnresolvedReason { module: NodeKey, target: String },
    /// A reason names neither a module nor an entrypoint.
    ReasonWithoutModule { module: NodeKey },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanModule { module, name } => match name {
                Some(name) => write!(f, "orphan module (no reasons): {name}"),
                None => write!(f, "orphan module (no reasons): {module}"),
            },
            Self::UnresolvedReason { module, target } => {
                write!(f, "module {module} was included by {target}, which is not in the graph")
            }
            Self::ReasonWithoutModule { module } => {
                write!(f, "module {module} has a reason that does not refer to a module")
            }
        }
    }
}

/// A freshly built graph and the warnings raised while building it.
#[derive(Debug, Clone)]
pub struct Built<G> {
    pub graph: G,
    pub warnings: Vec<BuildWarning>,
}

/// Build the module (and optionally entrypoint) dependency graph.
///
/// Modules are indexed by [`key::module_key`]; when several modules share a
/// key only the first is kept, later ones are dropped without merging. Each
/// module's reasons are then resolved to the nodes that included it and
/// recorded as `includer -> module` edges. Starting from every module, the
/// walk follows reasons up through the including modules with an explicit
/// worklist; a module's reasons are expanded once per build, so cyclic
/// reason chains terminate.
pub fn build_module_graph(doc: &StatsDocument, opts: &BuildOptions) -> Result<Built<Graph>> {
    let modules = doc.modules.as_ref().ok_or(Error::MissingInput("modules"))?;
    let entrypoints = if opts.include_entries {
        Some(
            doc.entrypoints
                .as_ref()
                .ok_or(Error::MissingInput("entrypoints"))?,
        )
    } else {
        None
    };

    let mut graph = Graph::new();
    // identifier -> key, for reasons that name a module by identifier while
    // the module itself is keyed by id
    let mut aliases: HashMap<String, NodeKey> = HashMap::new();
    let mut module_keys: Vec<NodeKey> = Vec::with_capacity(modules.len());

    for module in modules {
        let key = key::module_key(module)?;
        if !graph.add_node(
            key.clone(),
            Node::Module(ModuleNode {
                stats: module.clone(),
            }),
        ) {
            continue;
        }
        if let Some(ref identifier) = module.identifier {
            aliases.entry(identifier.clone()).or_insert_with(|| key.clone());
        }
        module_keys.push(key);
    }

    if let Some(entrypoints) = entrypoints {
        for (name, group) in entrypoints {
            graph.add_node(
                NodeKey::Entry(name.clone()),
                Node::Entry(EntryNode {
                    name: name.clone(),
                    chunk_group: group.clone(),
                }),
            );
        }
    }

    let mut builder = ReasonWalk {
        graph,
        aliases,
        opts,
        expanded: HashSet::new(),
        warnings: Vec::new(),
    };
    for start in &module_keys {
        builder.walk_from(start)?;
    }

    Ok(Built {
        graph: builder.graph,
        warnings: builder.warnings,
    })
}

struct ReasonWalk<'a> {
    graph: Graph,
    aliases: HashMap<String, NodeKey>,
    opts: &'a BuildOptions,
    expanded: HashSet<NodeKey>,
    warnings: Vec<BuildWarning>,
}

impl ReasonWalk<'_> {
    fn walk_from(&mut self, start: &NodeKey) -> Result<()> {
        let mut stack = vec![start.clone()];
        while let Some(key) = stack.pop() {
            if !self.expanded.insert(key.clone()) {
                continue;
            }
            let includers = self.resolve_includers(&key)?;
            for includer in includers {
                self.graph.add_edge(&includer, &key);
                if !includer.is_entry() && !self.expanded.contains(&includer) {
                    stack.push(includer);
                }
            }
        }
        Ok(())
    }

    /// Keys of the nodes that directly caused `key` to be included.
    fn resolve_includers(&mut self, key: &NodeKey) -> Result<Vec<NodeKey>> {
        let Some(Node::Module(module)) = self.graph.node(key) else {
            return Ok(Vec::new());
        };
        let module = &module.stats;

        let Some(ref reasons) = module.reasons else {
            return match self.opts.reasons {
                ReasonPolicy::Strict => Err(malformed(key, module, "module has no reasons")),
                ReasonPolicy::Tolerant => {
                    self.warnings.push(BuildWarning::OrphanModule {
                        module: key.clone(),
                        name: module.name.clone(),
                    });
                    Ok(Vec::new())
                }
            };
        };

        let mut includers = Vec::new();
        let mut seen: HashSet<NodeKey> = HashSet::new();
        for reason in reasons {
            if reason.is_entry() && !self.opts.include_entries {
                continue;
            }
            let target = match key::reason_target(reason)? {
                Some(target) => target,
                None if self.opts.reasons == ReasonPolicy::Strict => {
                    return Err(malformed(key, module, "reason does not refer to a module"));
                }
                None => {
                    self.warnings.push(BuildWarning::ReasonWithoutModule {
                        module: key.clone(),
                    });
                    continue;
                }
            };

            let (resolved, label) = match target {
                ReasonTarget::Entry(entry) => {
                    let label = entry.to_string();
                    (self.graph.contains(&entry).then_some(entry), label)
                }
                ReasonTarget::Module {
                    key: by_id,
                    identifier,
                } => {
                    let label = by_id.to_string();
                    let resolved = if self.graph.contains(&by_id) {
                        Some(by_id)
                    } else {
                        identifier.and_then(|ident| self.aliases.get(&ident).cloned())
                    };
                    (resolved, label)
                }
            };

            match resolved {
                // a module importing itself is not an inclusion edge
                Some(includer) if includer == *key => {}
                Some(includer) => {
                    if seen.insert(includer.clone()) {
                        includers.push(includer);
                    }
                }
                None => self.warnings.push(BuildWarning::UnresolvedReason {
                    module: key.clone(),
                    target: label,
                }),
            }
        }
        Ok(includers)
    }
}

fn malformed(key: &NodeKey, module: &Module, problem: &str) -> Error {
    Error::MalformedModule {
        module: module
            .name
            .clone()
            .unwrap_or_else(|| key.to_string()),
        problem: problem.to_string(),
    }
}

fn chunk_index(chunks: &[Chunk]) -> Result<BTreeMap<String, &Chunk>> {
    let mut index = BTreeMap::new();
    for chunk in chunks {
        index.entry(key::chunk_key(chunk)?).or_insert(chunk);
    }
    Ok(index)
}

/// Restrict a module graph to modules that belong to a chunk matching
/// `filter`, together with the modules that directly included them.
///
/// Kept edges are the ones leading into a matching module. An empty filter
/// keeps the whole graph, modules without chunks included. A module that
/// lists a chunk id absent from the document's chunk list is an internal
/// inconsistency and fails with [`Error::UnresolvedReference`].
pub fn restrict_to_chunks(
    graph: &Graph,
    doc: &StatsDocument,
    filter: &ChunkFilter,
) -> Result<Graph> {
    if filter.is_empty() {
        return Ok(graph.clone());
    }
    let chunks = doc.chunks.as_ref().ok_or(Error::MissingInput("chunks"))?;
    let index = chunk_index(chunks)?;

    let mut seeds: BTreeSet<&NodeKey> = BTreeSet::new();
    for (key, module) in graph.modules() {
        let mut in_matching_chunk = false;
        for id in &module.stats.chunks {
            let chunk_key = id.to_string();
            let chunk = index
                .get(&chunk_key)
                .ok_or_else(|| Error::UnresolvedReference {
                    from: format!("module {key}"),
                    kind: RecordKind::Chunk,
                    target: chunk_key.clone(),
                })?;
            in_matching_chunk |= filter.matches(chunk);
        }
        if in_matching_chunk {
            seeds.insert(key);
        }
    }

    let mut out = Graph::new();
    for &seed in &seeds {
        copy_node(graph, &mut out, seed)?;
        for parent in graph.parents_of(seed) {
            copy_node(graph, &mut out, parent)?;
            out.add_edge(parent, seed);
        }
    }
    Ok(out)
}

fn copy_node(from: &Graph, to: &mut Graph, key: &NodeKey) -> Result<()> {
    let node = from
        .node(key)
        .ok_or_else(|| Error::DanglingReference(key.to_string()))?;
    if !to.contains(key) {
        to.add_node(key.clone(), node.clone());
    }
    Ok(())
}

/// Build the chunk dependency graph.
///
/// An edge `parent -> chunk` is counted for every declared parent when either
/// end matches `filter`. Retained chunks are the matching chunks plus both
/// ends of every counted edge; each lists the emitted files found in the
/// asset list. A parent id that names no chunk fails with
/// [`Error::UnresolvedReference`].
pub fn build_chunk_graph(doc: &StatsDocument, filter: &ChunkFilter) -> Result<ChunkGraph> {
    let chunks = doc.chunks.as_ref().ok_or(Error::MissingInput("chunks"))?;
    let assets = doc.assets.as_ref().ok_or(Error::MissingInput("assets"))?;

    let asset_index: HashMap<&str, _> = assets.iter().map(|a| (key::asset_key(a), a)).collect();
    let index = chunk_index(chunks)?;

    let mut graph = ChunkGraph::default();
    let mut retained: BTreeSet<String> = BTreeSet::new();

    for chunk in chunks {
        let chunk_key = key::chunk_key(chunk)?;
        let chunk_matches = filter.matches(chunk);
        if chunk_matches {
            retained.insert(chunk_key.clone());
        }
        for parent in &chunk.parents {
            let parent_key = parent.to_string();
            let parent_chunk =
                index
                    .get(&parent_key)
                    .ok_or_else(|| Error::UnresolvedReference {
                        from: format!("chunk {chunk_key}"),
                        kind: RecordKind::Chunk,
                        target: parent_key.clone(),
                    })?;
            if chunk_matches || filter.matches(parent_chunk) {
                graph.add_edge(&parent_key, &chunk_key);
                retained.insert(parent_key);
                retained.insert(chunk_key.clone());
            }
        }
    }

    for chunk_key in retained {
        let Some(&chunk) = index.get(&chunk_key) else {
            continue;
        };
        for file in &chunk.files {
            if let Some(&asset) = asset_index.get(file.as_str()) {
                graph.assets.insert(file.clone(), asset.clone());
                graph
                    .chunk_assets
                    .entry(chunk_key.clone())
                    .or_default()
                    .insert(file.clone());
            }
        }
        graph.chunks.insert(chunk_key, chunk.clone());
    }

    Ok(graph)
}
