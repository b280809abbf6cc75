//! Session: owns a loaded stats document and runs the graph pipelines.
//!
//! A [`Session`] is the primary interface for library consumers. Each
//! pipeline builds a fresh graph from the document, narrows it, computes
//! metrics over what remains and returns a report together with the
//! warnings raised while building.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::builder::{self, BuildOptions, BuildWarning, ReasonPolicy};
use crate::error::Result;
use crate::filter::{ChunkFilter, ModuleFilter};
use crate::graph::Graph;
use crate::loader;
use crate::query::{self, Direction};
use crate::report::{ChunkGraphReport, ForceGraph, ModuleGraphReport};
use crate::stats::StatsDocument;

/// Options of the module graph pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleQuery {
    pub chunks: ChunkFilter,
    pub modules: ModuleFilter,
    pub direction: Direction,
    /// Keep modules without reasons as roots instead of failing.
    pub allow_orphans: bool,
}

/// Options of the interactive export pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportQuery {
    pub modules: ModuleFilter,
    pub direction: Direction,
}

impl Default for ExportQuery {
    fn default() -> Self {
        Self {
            modules: ModuleFilter::default(),
            direction: Direction::Children,
        }
    }
}

/// A pipeline result and the non-fatal findings that came with it.
#[derive(Debug, Clone)]
pub struct Analysis<R> {
    pub report: R,
    pub warnings: Vec<BuildWarning>,
}

/// An open stats document.
pub struct Session {
    document: StatsDocument,
    path: PathBuf,
}

impl Session {
    /// Load and validate the stats file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let loaded = loader::load_stats(path)?;
        Ok(Self {
            document: loaded.document,
            path: loaded.path,
        })
    }

    /// Wrap an already parsed document.
    pub fn from_document(document: StatsDocument, path: impl Into<PathBuf>) -> Self {
        Self {
            document,
            path: path.into(),
        }
    }

    /// Chunk dependency graph narrowed by `filter`.
    pub fn chunk_report(&self, filter: &ChunkFilter) -> Result<ChunkGraphReport> {
        let graph = builder::build_chunk_graph(&self.document, filter)?;
        debug!(
            chunks = graph.chunks.len(),
            edges = graph.edge_count(),
            "built chunk graph"
        );
        Ok(ChunkGraphReport::new(&graph))
    }

    /// Module graph restricted to matching chunks, then to the ancestors or
    /// descendants of matching modules.
    pub fn module_report(&self, query: &ModuleQuery) -> Result<Analysis<ModuleGraphReport>> {
        let opts = BuildOptions {
            include_entries: false,
            reasons: if query.allow_orphans {
                ReasonPolicy::Tolerant
            } else {
                ReasonPolicy::Strict
            },
        };
        let built = builder::build_module_graph(&self.document, &opts)?;
        log_build(&built.graph, &built.warnings);

        let graph = builder::restrict_to_chunks(&built.graph, &self.document, &query.chunks)?;
        let graph = self.narrow(&graph, query.direction, &query.modules);
        let report = self.report(&graph, &query.modules, &built.warnings)?;
        Ok(Analysis {
            report,
            warnings: built.warnings,
        })
    }

    /// Entry-aware module graph for the interactive viewer.
    pub fn export(&self, query: &ExportQuery) -> Result<Analysis<ForceGraph>> {
        let built = builder::build_module_graph(&self.document, &BuildOptions::default())?;
        log_build(&built.graph, &built.warnings);

        let graph = self.narrow(&built.graph, query.direction, &query.modules);
        let report = self.report(&graph, &query.modules, &built.warnings)?;
        Ok(Analysis {
            report: report.to_force_graph(),
            warnings: built.warnings,
        })
    }

    fn narrow(&self, graph: &Graph, direction: Direction, filter: &ModuleFilter) -> Graph {
        let filter = filter.module_name.is_some().then_some(filter);
        let narrowed = query::extract(graph, direction, filter);
        debug!(
            nodes = narrowed.node_count(),
            edges = narrowed.edge_count(),
            ?direction,
            "extracted subgraph"
        );
        narrowed
    }

    fn report(
        &self,
        graph: &Graph,
        filter: &ModuleFilter,
        warnings: &[BuildWarning],
    ) -> Result<ModuleGraphReport> {
        let metrics = query::compute_metrics(graph)?;
        let chunks = self.document.chunks.as_deref().unwrap_or_default();
        let filter = filter.module_name.is_some().then_some(filter);
        Ok(ModuleGraphReport::new(graph, &metrics, chunks, filter, warnings))
    }

    pub fn document(&self) -> &StatsDocument {
        &self.document
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn log_build(graph: &Graph, warnings: &[BuildWarning]) {
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        warnings = warnings.len(),
        "built module graph"
    );
    for warning in warnings {
        debug!("{warning}");
    }
}
