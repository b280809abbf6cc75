//! Report types rendered as terminal text, JSON, Graphviz DOT and the
//! force-graph hand-off format.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::builder::BuildWarning;
use crate::error::{Error, Result};
use crate::filter::ModuleFilter;
use crate::graph::{ChunkGraph, Graph, Node};
use crate::key::{self, NodeKey};
use crate::query::SubgraphMetrics;
use crate::stats::Chunk;

/// Base node size of the force-graph output.
const FORCE_NODE_SIZE: f64 = 32.0;

/// How many modules the terminal summary lists.
const TOP_MODULES: usize = 10;

#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{bytes} B")
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Quote a string for use as a DOT id or label.
fn dot_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Render {
        format: "json".to_string(),
        message: e.to_string(),
    })
}

fn chunk_label(chunk: &Chunk, chunk_key: &str) -> String {
    if chunk.names.is_empty() {
        chunk_key.to_string()
    } else {
        chunk.names.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entry,
    Module,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportNode {
    pub key: NodeKey,
    pub label: String,
    pub kind: NodeKind,
    /// `None` for entries and for modules without a recorded size.
    pub size: Option<u64>,
    pub own_size: u64,
    pub subgraph_size: u64,
    /// Selected by the module filter (as opposed to pulled in by the walk).
    pub matched: bool,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEdge {
    pub source: NodeKey,
    pub target: NodeKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkCluster {
    pub key: String,
    pub label: String,
}

/// A module (and entry) graph prepared for output.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleGraphReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<ReportNode>,
    pub edges: Vec<ReportEdge>,
    /// Chunks that own at least one reported module.
    pub clusters: Vec<ChunkCluster>,
    pub warnings: Vec<String>,
    /// Up to `TOP_MODULES` module keys, heaviest subgraph first.
    #[serde(skip)]
    pub heaviest: Vec<NodeKey>,
}

impl ModuleGraphReport {
    /// `chunks` supplies cluster labels and may be empty. `filter` marks the
    /// nodes it selects; entries are never marked.
    pub fn new(
        graph: &Graph,
        metrics: &SubgraphMetrics,
        chunks: &[Chunk],
        filter: Option<&ModuleFilter>,
        warnings: &[BuildWarning],
    ) -> Self {
        let nodes: Vec<ReportNode> = graph
            .nodes()
            .map(|(key, node)| match node {
                Node::Entry(_) => ReportNode {
                    key: key.clone(),
                    label: node.label(),
                    kind: NodeKind::Entry,
                    size: None,
                    own_size: 0,
                    subgraph_size: 0,
                    matched: false,
                    chunks: Vec::new(),
                },
                Node::Module(m) => ReportNode {
                    key: key.clone(),
                    label: node.label(),
                    kind: NodeKind::Module,
                    size: m.stats.size,
                    own_size: metrics.own_size.get(key).copied().unwrap_or(0),
                    subgraph_size: metrics.subgraph_size.get(key).copied().unwrap_or(0),
                    matched: filter.is_some_and(|f| f.matches(&m.stats)),
                    chunks: m.stats.chunks.iter().map(ToString::to_string).collect(),
                },
            })
            .collect();

        let used: BTreeSet<&str> = nodes
            .iter()
            .filter_map(|n| n.chunks.first().map(String::as_str))
            .collect();
        let mut clusters = Vec::new();
        let mut seen = BTreeSet::new();
        for chunk in chunks {
            let Ok(chunk_key) = key::chunk_key(chunk) else {
                continue;
            };
            if used.contains(chunk_key.as_str()) && seen.insert(chunk_key.clone()) {
                clusters.push(ChunkCluster {
                    label: chunk_label(chunk, &chunk_key),
                    key: chunk_key,
                });
            }
        }

        let edges: Vec<ReportEdge> = graph
            .edges()
            .map(|(p, c)| ReportEdge {
                source: p.clone(),
                target: c.clone(),
            })
            .collect();

        Self {
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes,
            edges,
            clusters,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            heaviest: metrics
                .heaviest(TOP_MODULES)
                .into_iter()
                .map(|(key, _)| key.clone())
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} node{}, {} edge{}",
            self.node_count,
            plural(self.node_count),
            self.edge_count,
            plural(self.edge_count),
        );

        if self.heaviest.is_empty() {
            return out;
        }

        let _ = writeln!(out, "\nHeaviest modules (own / with descendants):");
        for key in &self.heaviest {
            let Some(node) = self.nodes.iter().find(|n| &n.key == key) else {
                continue;
            };
            let _ = writeln!(
                out,
                "  {:<50} {:>8} {:>8}{}",
                node.label,
                format_size(node.own_size),
                format_size(node.subgraph_size),
                if node.matched { "  *" } else { "" },
            );
        }
        let modules = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Module)
            .count();
        if modules > self.heaviest.len() {
            let _ = writeln!(
                out,
                "  ... and {} more modules",
                modules - self.heaviest.len()
            );
        }
        out
    }

    /// Graphviz source: modules are boxes clustered under their first chunk.
    pub fn to_dot(&self) -> String {
        let mut by_cluster: BTreeMap<&str, Vec<&ReportNode>> = BTreeMap::new();
        let mut loose: Vec<&ReportNode> = Vec::new();
        let clustered: BTreeSet<&str> = self.clusters.iter().map(|c| c.key.as_str()).collect();
        for node in &self.nodes {
            match node.chunks.first() {
                Some(chunk) if clustered.contains(chunk.as_str()) => {
                    by_cluster.entry(chunk.as_str()).or_default().push(node);
                }
                _ => loose.push(node),
            }
        }

        let mut out = String::from("digraph G {\n  layout=dot;\n  ranksep=2.0;\n");
        for cluster in &self.clusters {
            let _ = writeln!(
                out,
                "  subgraph {} {{\n    label={};",
                dot_quote(&format!("cluster_{}", cluster.key)),
                dot_quote(&cluster.label),
            );
            for node in by_cluster.get(cluster.key.as_str()).into_iter().flatten() {
                let _ = writeln!(out, "    {}", dot_node(node));
            }
            out.push_str("  }\n");
        }
        for node in loose {
            let _ = writeln!(out, "  {}", dot_node(node));
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "  {} -> {};",
                dot_quote(&edge.source.to_string()),
                dot_quote(&edge.target.to_string()),
            );
        }
        out.push_str("}\n");
        out
    }

    /// Nodes and edges for an interactive force-directed viewer.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_force_graph(&self) -> ForceGraph {
        let max_size = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Module)
            .map(|n| n.size.unwrap_or(1))
            .max()
            .unwrap_or(1)
            .max(1);
        let scale = (max_size as f64).sqrt();

        let nodes = self
            .nodes
            .iter()
            .map(|n| match n.kind {
                NodeKind::Entry => ForceNode {
                    key: n.key.clone(),
                    label: format!("Entrypoint: {}", n.label),
                    kind: n.kind,
                    size: FORCE_NODE_SIZE * 0.5,
                    color: Some("#f00".to_string()),
                    own_size: n.own_size,
                    subgraph_size: n.subgraph_size,
                },
                NodeKind::Module => ForceNode {
                    key: n.key.clone(),
                    label: n.label.clone(),
                    kind: n.kind,
                    size: (n.size.unwrap_or(1) as f64).sqrt() / scale * FORCE_NODE_SIZE,
                    color: None,
                    own_size: n.own_size,
                    subgraph_size: n.subgraph_size,
                },
            })
            .collect();

        ForceGraph {
            nodes,
            edges: self.edges.clone(),
        }
    }
}

fn dot_node(node: &ReportNode) -> String {
    let label = match node.kind {
        NodeKind::Entry => format!("entry: {}", node.label),
        NodeKind::Module => format!(
            "{}\n{} / {}",
            node.label,
            format_size(node.own_size),
            format_size(node.subgraph_size)
        ),
    };
    let style = match (node.kind, node.matched) {
        (NodeKind::Entry, _) => ", style=filled, fillcolor=red",
        (NodeKind::Module, true) => ", style=filled, fillcolor=yellow",
        (NodeKind::Module, false) => "",
    };
    format!(
        "{} [shape=box, label={}{style}];",
        dot_quote(&node.key.to_string()),
        dot_quote(&label)
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceNode {
    pub key: NodeKey,
    pub label: String,
    pub kind: NodeKind,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub own_size: u64,
    pub subgraph_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceGraph {
    pub nodes: Vec<ForceNode>,
    pub edges: Vec<ReportEdge>,
}

impl ForceGraph {
    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportAsset {
    pub name: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportChunk {
    pub key: String,
    pub label: String,
    pub files: Vec<String>,
    pub assets: Vec<ReportAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkGraphReport {
    pub chunk_count: usize,
    pub edge_count: usize,
    pub chunks: Vec<ReportChunk>,
    pub edges: Vec<WeightedEdge>,
}

impl ChunkGraphReport {
    pub fn new(graph: &ChunkGraph) -> Self {
        let chunks: Vec<ReportChunk> = graph
            .chunks
            .iter()
            .map(|(chunk_key, chunk)| ReportChunk {
                key: chunk_key.clone(),
                label: chunk_label(chunk, chunk_key),
                files: chunk.files.clone(),
                assets: graph
                    .chunk_assets
                    .get(chunk_key)
                    .into_iter()
                    .flatten()
                    .filter_map(|name| graph.assets.get(name))
                    .map(|asset| ReportAsset {
                        name: asset.name.clone(),
                        size: asset.size,
                    })
                    .collect(),
            })
            .collect();
        let edges: Vec<WeightedEdge> = graph
            .weighted_edges()
            .map(|(source, target, weight)| WeightedEdge {
                source: source.to_string(),
                target: target.to_string(),
                weight,
            })
            .collect();
        Self {
            chunk_count: chunks.len(),
            edge_count: edges.len(),
            chunks,
            edges,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} chunk{}, {} edge{}\n",
            self.chunk_count,
            plural(self.chunk_count),
            self.edge_count,
            plural(self.edge_count),
        );
        for chunk in &self.chunks {
            let total: u64 = chunk.assets.iter().filter_map(|a| a.size).sum();
            let _ = writeln!(
                out,
                "  {:<40} {:>8}  {} asset{}",
                format!("{} ({})", chunk.label, chunk.key),
                format_size(total),
                chunk.assets.len(),
                plural(chunk.assets.len()),
            );
        }
        out
    }

    /// Graphviz source: one box per chunk listing its emitted assets.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph G {\n  layout=dot;\n");
        for chunk in &self.chunks {
            let mut label = chunk.label.clone();
            for asset in &chunk.assets {
                label.push('\n');
                label.push_str(&asset.name);
            }
            let _ = writeln!(
                out,
                "  {} [shape=box, label={}];",
                dot_quote(&chunk.key),
                dot_quote(&label)
            );
        }
        for edge in &self.edges {
            if edge.weight > 1 {
                let _ = writeln!(
                    out,
                    "  {} -> {} [label=\"{}\"];",
                    dot_quote(&edge.source),
                    dot_quote(&edge.target),
                    edge.weight
                );
            } else {
                let _ = writeln!(
                    out,
                    "  {} -> {};",
                    dot_quote(&edge.source),
                    dot_quote(&edge.target)
                );
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, build_chunk_graph, build_module_graph};
    use crate::filter::ChunkFilter;
    use crate::query::compute_metrics;
    use crate::stats::StatsDocument;

    const STATS: &str = r#"{
        "chunks": [
            {"id": 0, "names": ["main"], "files": ["main.js"], "parents": []},
            {"id": 1, "names": [], "files": ["1.js"], "parents": [0]}
        ],
        "assets": [{"name": "main.js", "size": 1200}, {"name": "1.js", "size": 80}],
        "entrypoints": {"main": {"name": "main", "chunks": [0], "assets": ["main.js"]}},
        "modules": [
            {"id": 1, "name": "./a.js", "size": 10, "chunks": [0],
             "reasons": [{"type": "entry", "loc": "main"}]},
            {"id": 2, "name": "./b \"quoted\".js", "size": 20, "chunks": [0],
             "reasons": [{"type": "harmony import", "moduleId": 1}]},
            {"id": 3, "name": "./lazy.js", "size": 5, "chunks": [1],
             "reasons": [{"type": "import()", "moduleId": 2}]}
        ]
    }"#;

    fn module_report(filter: Option<&ModuleFilter>) -> ModuleGraphReport {
        let doc: StatsDocument = serde_json::from_str(STATS).unwrap();
        let built = build_module_graph(&doc, &BuildOptions::default()).unwrap();
        let metrics = compute_metrics(&built.graph).unwrap();
        ModuleGraphReport::new(
            &built.graph,
            &metrics,
            doc.chunks.as_deref().unwrap_or_default(),
            filter,
            &built.warnings,
        )
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1_500), "2 KB");
        assert_eq!(format_size(2_500_000), "2.5 MB");
    }

    #[test]
    fn dot_clusters_modules_by_first_chunk() {
        let dot = module_report(None).to_dot();
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("ranksep=2.0"));
        assert!(dot.contains("subgraph \"cluster_0\""));
        assert!(dot.contains("label=\"main\""));
        // unnamed chunk falls back to its id
        assert!(dot.contains("label=\"1\""));
        assert!(dot.contains("\"1\" -> \"2\";"));
        assert!(dot.contains("\"entry:main\" -> \"1\";"));
    }

    #[test]
    fn dot_escapes_quotes() {
        let dot = module_report(None).to_dot();
        assert!(dot.contains(r#"./b \"quoted\".js"#));
    }

    #[test]
    fn dot_highlights_matches() {
        let dot = module_report(Some(&ModuleFilter::new("lazy"))).to_dot();
        assert!(dot.contains("fillcolor=yellow"));
        assert!(dot.contains("fillcolor=red"));
    }

    #[test]
    fn terminal_lists_heaviest_first() {
        let text = module_report(None).to_terminal();
        assert!(text.starts_with("4 nodes, 3 edges"));
        let a = text.find("./a.js").unwrap();
        let lazy = text.find("./lazy.js").unwrap();
        assert!(a < lazy);
    }

    #[test]
    fn terminal_breaks_size_ties_by_key() {
        let doc: StatsDocument = serde_json::from_str(
            r#"{
            "chunks": [],
            "modules": [
                {"id": 2, "name": "./second.js", "size": 7, "reasons": []},
                {"id": 3, "name": "./third.js", "size": 7, "reasons": []},
                {"id": 1, "name": "./first.js", "size": 7, "reasons": []},
                {"id": 4, "name": "./big.js", "size": 90, "reasons": []}
            ]
        }"#,
        )
        .unwrap();
        let built = build_module_graph(&doc, &BuildOptions::default()).unwrap();
        let metrics = compute_metrics(&built.graph).unwrap();
        let report = ModuleGraphReport::new(&built.graph, &metrics, &[], None, &built.warnings);

        let text = report.to_terminal();
        let at = |label: &str| text.find(label).unwrap();
        assert!(at("./big.js") < at("./first.js"));
        assert!(at("./first.js") < at("./second.js"));
        assert!(at("./second.js") < at("./third.js"));
    }

    #[test]
    fn terminal_summary_is_capped() {
        let modules: Vec<String> = (1..=TOP_MODULES + 2)
            .map(|i| format!(r#"{{"id": {i}, "name": "./m{i}.js", "size": {i}, "reasons": []}}"#))
            .collect();
        let json = format!(r#"{{"chunks": [], "modules": [{}]}}"#, modules.join(","));
        let doc: StatsDocument = serde_json::from_str(&json).unwrap();
        let built = build_module_graph(&doc, &BuildOptions::default()).unwrap();
        let metrics = compute_metrics(&built.graph).unwrap();
        let report = ModuleGraphReport::new(&built.graph, &metrics, &[], None, &built.warnings);

        assert_eq!(report.heaviest.len(), TOP_MODULES);
        let text = report.to_terminal();
        assert!(text.contains("... and 2 more modules"));
        assert!(!text.contains("./m1.js "));
    }

    #[test]
    fn force_graph_scales_sizes() {
        let force = module_report(None).to_force_graph();
        let entry = force.nodes.iter().find(|n| n.kind == NodeKind::Entry).unwrap();
        assert_eq!(entry.label, "Entrypoint: main");
        assert_eq!(entry.color.as_deref(), Some("#f00"));
        assert!((entry.size - 16.0).abs() < f64::EPSILON);

        let largest = force
            .nodes
            .iter()
            .find(|n| n.label.contains("quoted"))
            .unwrap();
        assert!((largest.size - 32.0).abs() < 1e-9);
        assert_eq!(force.edges.len(), 3);
    }

    #[test]
    fn chunk_report_lists_assets_and_edges() {
        let doc: StatsDocument = serde_json::from_str(STATS).unwrap();
        let graph = build_chunk_graph(&doc, &ChunkFilter::default()).unwrap();
        let report = ChunkGraphReport::new(&graph);
        assert_eq!(report.chunk_count, 2);
        assert_eq!(report.edges.len(), 1);
        assert_eq!(report.chunks[0].assets[0].name, "main.js");

        let dot = report.to_dot();
        assert!(dot.contains("\"0\" -> \"1\";"));
        assert!(report.to_terminal().contains("main (0)"));
    }
}
