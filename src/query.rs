use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{Error, Result};
use crate::filter::ModuleFilter;
use crate::graph::{Graph, ModuleNode};
use crate::key::NodeKey;

/// Which way to walk from the modules a filter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Everything that (transitively) includes the selected modules.
    #[default]
    Parents,
    /// Everything the selected modules (transitively) include.
    Children,
}

impl Direction {
    fn next<'g>(self, graph: &'g Graph, key: &NodeKey) -> &'g BTreeSet<NodeKey> {
        match self {
            Self::Parents => graph.parents_of(key),
            Self::Children => graph.children_of(key),
        }
    }
}

/// Restrict `graph` to the modules matching `filter` and everything reachable
/// from them in `direction`. Without a filter the graph is returned as is.
pub fn extract(graph: &Graph, direction: Direction, filter: Option<&ModuleFilter>) -> Graph {
    match filter {
        Some(filter) => extract_by(graph, direction, |m| filter.matches(&m.stats)),
        None => graph.clone(),
    }
}

/// Induced subgraph over the modules selected by `predicate` plus every node
/// reachable from them in `direction`.
///
/// The result keeps every edge of `graph` whose endpoints were both retained,
/// not only the edges the walk followed, so two retained siblings stay linked.
/// Entry nodes are never seeds but are retained when reached.
pub fn extract_by<F>(graph: &Graph, direction: Direction, predicate: F) -> Graph
where
    F: Fn(&ModuleNode) -> bool,
{
    // One visited set serves all seeds: whatever is reachable from an already
    // retained node was retained with it.
    let mut retained: HashSet<&NodeKey> = HashSet::new();
    let mut stack: Vec<&NodeKey> = graph
        .modules()
        .filter(|(_, m)| predicate(m))
        .map(|(k, _)| k)
        .collect();

    while let Some(key) = stack.pop() {
        if !retained.insert(key) {
            continue;
        }
        for next in direction.next(graph, key) {
            if !retained.contains(next) {
                stack.push(next);
            }
        }
    }

    let mut out = Graph::new();
    for (key, node) in graph.nodes() {
        if retained.contains(key) {
            out.add_node(key.clone(), node.clone());
        }
    }
    for (parent, child) in graph.edges() {
        if retained.contains(parent) && retained.contains(child) {
            out.add_edge(parent, child);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphMetrics {
    /// Size of the module itself.
    pub own_size: BTreeMap<NodeKey, u64>,
    /// Own size plus the own size of every distinct descendant module.
    pub subgraph_size: BTreeMap<NodeKey, u64>,
}

impl SubgraphMetrics {
    /// The `n` modules with the largest subgraph size, ties broken by key.
    pub fn heaviest(&self, n: usize) -> Vec<(&NodeKey, u64)> {
        let mut ranked: Vec<_> = self.subgraph_size.iter().map(|(k, &s)| (k, s)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Own and transitive size of every module in `graph`.
///
/// Each module's descendants are counted once even when reachable along
/// several paths or through a cycle; a module is never its own descendant.
/// A child key missing from the node map fails with
/// [`Error::DanglingReference`].
pub fn compute_metrics(graph: &Graph) -> Result<SubgraphMetrics> {
    let mut metrics = SubgraphMetrics::default();

    for (key, module) in graph.modules() {
        metrics.own_size.insert(key.clone(), module.stats.own_size());
    }

    for (root, module) in graph.modules() {
        let mut total = module.stats.own_size();
        let mut visited: HashSet<&NodeKey> = HashSet::from([root]);
        let mut stack: Vec<&NodeKey> = graph.children_of(root).iter().collect();

        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                continue;
            }
            let node = graph
                .node(key)
                .ok_or_else(|| Error::DanglingReference(key.to_string()))?;
            if let Some(child) = node.as_module() {
                total += child.stats.own_size();
            }
            stack.extend(
                graph
                    .children_of(key)
                    .iter()
                    .filter(|next| !visited.contains(next)),
            );
        }

        metrics.subgraph_size.insert(root.clone(), total);
    }

    Ok(metrics)
}
