//! Dependency graph data structures.
//!
//! A [`Graph`] is a directed graph of modules (and optionally entrypoints)
//! keyed by [`NodeKey`]. Edges point from the includer to the included
//! module and are stored twice, once in `children` and once in `parents`;
//! the two maps are exact inverses of each other. A [`ChunkGraph`] is the
//! chunk-level variant with weighted edges.

use std::collections::{BTreeMap, BTreeSet};

use crate::key::NodeKey;
use crate::stats::{Asset, Chunk, ChunkGroup, Module};

#[derive(Debug, Clone, PartialEq)]
pub struct EntryNode {
    pub name: String,
    pub chunk_group: ChunkGroup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub stats: Module,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entry(EntryNode),
    Module(ModuleNode),
}

impl Node {
    pub fn as_module(&self) -> Option<&ModuleNode> {
        match self {
            Self::Module(m) => Some(m),
            Self::Entry(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Entry(e) => e.name.clone(),
            Self::Module(m) => m.stats.label().unwrap_or("(anonymous)").to_string(),
        }
    }
}

type Adjacency = BTreeMap<NodeKey, BTreeSet<NodeKey>>;

static NO_EDGES: BTreeSet<NodeKey> = BTreeSet::new();

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeKey, Node>,
    children: Adjacency,
    parents: Adjacency,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same key exists. Returns whether
    /// the node was inserted; the first node for a key wins.
    pub(crate) fn add_node(&mut self, key: NodeKey, node: Node) -> bool {
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.nodes.insert(key, node);
        true
    }

    /// Record `parent -> child` in both directions. Duplicate edges collapse.
    pub(crate) fn add_edge(&mut self, parent: &NodeKey, child: &NodeKey) -> bool {
        let added = self
            .children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        added
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeKey, &Node)> {
        self.nodes.iter()
    }

    pub fn modules(&self) -> impl Iterator<Item = (&NodeKey, &ModuleNode)> {
        self.nodes
            .iter()
            .filter_map(|(k, n)| n.as_module().map(|m| (k, m)))
    }

    pub fn children_of(&self, key: &NodeKey) -> &BTreeSet<NodeKey> {
        self.children.get(key).unwrap_or(&NO_EDGES)
    }

    pub fn parents_of(&self, key: &NodeKey) -> &BTreeSet<NodeKey> {
        self.parents.get(key).unwrap_or(&NO_EDGES)
    }

    /// All edges as `(parent, child)` pairs in key order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeKey, &NodeKey)> {
        self.children
            .iter()
            .flat_map(|(parent, kids)| kids.iter().map(move |child| (parent, child)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.children.values().map(BTreeSet::len).sum()
    }

    /// Whether `children` and `parents` mirror each other exactly.
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .edges()
            .all(|(p, c)| self.parents.get(c).is_some_and(|ps| ps.contains(p)));
        let backward = self.parents.iter().all(|(c, ps)| {
            ps.iter()
                .all(|p| self.children.get(p).is_some_and(|cs| cs.contains(c)))
        });
        forward && backward
    }
}

/// Chunk-level graph. Edges run from a parent chunk to a chunk it loads and
/// carry the number of times that relation was observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkGraph {
    pub chunks: BTreeMap<String, Chunk>,
    pub assets: BTreeMap<String, Asset>,
    /// Emitted files of each retained chunk that appear in the asset list.
    pub chunk_assets: BTreeMap<String, BTreeSet<String>>,
    pub edges: BTreeMap<String, BTreeMap<String, u32>>,
}

impl ChunkGraph {
    pub(crate) fn add_edge(&mut self, parent: &str, child: &str) {
        *self
            .edges
            .entry(parent.to_owned())
            .or_default()
            .entry(child.to_owned())
            .or_insert(0) += 1;
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// `(parent, child, weight)` triples in key order.
    pub fn weighted_edges(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.edges.iter().flat_map(|(parent, kids)| {
            kids.iter()
                .map(move |(child, &w)| (parent.as_str(), child.as_str(), w))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Id;

    fn module_node(id: u64) -> Node {
        Node::Module(ModuleNode {
            stats: Module {
                id: Some(Id::Num(id)),
                ..Module::default()
            },
        })
    }

    fn key(id: &str) -> NodeKey {
        NodeKey::Module(id.into())
    }

    #[test]
    fn add_edge_deduplicates() {
        let mut g = Graph::new();
        g.add_node(key("1"), module_node(1));
        g.add_node(key("2"), module_node(2));

        assert!(g.add_edge(&key("1"), &key("2")));
        assert!(!g.add_edge(&key("1"), &key("2")));

        assert_eq!(g.edge_count(), 1, "duplicate edges should collapse");
        assert_eq!(g.parents_of(&key("2")).len(), 1);
    }

    #[test]
    fn add_edge_keeps_maps_inverse() {
        let mut g = Graph::new();
        for id in 1..=3 {
            g.add_node(key(&id.to_string()), module_node(id));
        }
        g.add_edge(&key("1"), &key("2"));
        g.add_edge(&key("2"), &key("3"));
        g.add_edge(&key("1"), &key("3"));

        assert!(g.is_consistent());
        assert!(g.children_of(&key("1")).contains(&key("3")));
        assert!(g.parents_of(&key("3")).contains(&key("1")));
        assert!(g.children_of(&key("3")).is_empty());
    }

    #[test]
    fn first_node_for_a_key_wins() {
        let mut g = Graph::new();
        assert!(g.add_node(key("1"), module_node(1)));
        let duplicate = Node::Module(ModuleNode {
            stats: Module {
                id: Some(Id::Num(1)),
                name: Some("later".into()),
                ..Module::default()
            },
        });
        assert!(!g.add_node(key("1"), duplicate));
        assert_eq!(g.node(&key("1")).unwrap().label(), "(anonymous)");
    }

    #[test]
    fn chunk_edges_count_observations() {
        let mut g = ChunkGraph::default();
        g.add_edge("0", "1");
        g.add_edge("0", "1");
        g.add_edge("0", "2");

        assert_eq!(g.edge_count(), 2);
        let weights: Vec<_> = g.weighted_edges().collect();
        assert_eq!(weights, vec![("0", "1", 2), ("0", "2", 1)]);
    }
}
