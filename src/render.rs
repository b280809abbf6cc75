//! Writing reports to disk.
//!
//! `dot` and `json` are written directly. Every other format is produced by
//! piping the DOT source through the Graphviz `dot` executable.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::report::{ChunkGraphReport, ModuleGraphReport};

/// Something that can be written as Graphviz source or JSON.
pub trait Renderable {
    fn to_dot(&self) -> String;
    fn to_json(&self) -> Result<String>;
}

impl Renderable for ModuleGraphReport {
    fn to_dot(&self) -> String {
        ModuleGraphReport::to_dot(self)
    }

    fn to_json(&self) -> Result<String> {
        ModuleGraphReport::to_json(self)
    }
}

impl Renderable for ChunkGraphReport {
    fn to_dot(&self) -> String {
        ChunkGraphReport::to_dot(self)
    }

    fn to_json(&self) -> Result<String> {
        ChunkGraphReport::to_json(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// `dot`, `json`, or any output format Graphviz understands.
    pub format: String,
    /// Defaults to `./graph.<format>`.
    pub path: Option<PathBuf>,
    /// Graphviz executable.
    pub graphviz: PathBuf,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: "svg".to_string(),
            path: None,
            graphviz: PathBuf::from("dot"),
        }
    }
}

impl OutputOptions {
    pub fn output_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("./graph.{}", self.format)))
    }
}

/// Render `report` per `opts` and return the path written.
pub fn write_report(report: &impl Renderable, opts: &OutputOptions) -> Result<PathBuf> {
    let path = opts.output_path();
    match opts.format.as_str() {
        "dot" | "gv" => write_file(&path, report.to_dot().as_bytes())?,
        "json" => write_file(&path, report.to_json()?.as_bytes())?,
        format => run_graphviz(&opts.graphviz, format, &report.to_dot(), &path)?,
    }
    info!(format = %opts.format, "wrote {}", path.display());
    Ok(path)
}

pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn run_graphviz(program: &Path, format: &str, dot: &str, path: &Path) -> Result<()> {
    let render_err = |message: String| Error::Render {
        format: format.to_string(),
        message,
    };

    debug!("running {} -T{format}", program.display());
    let mut child = Command::new(program)
        .arg(format!("-T{format}"))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                render_err(format!("graphviz executable '{}' not found", program.display()))
            }
            _ => render_err(format!("cannot run '{}': {e}", program.display())),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // dot may exit early on a bad format and close its end of the pipe;
        // its stderr below says why
        if let Err(e) = stdin.write_all(dot.as_bytes())
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(render_err(e.to_string()));
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| render_err(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(render_err(if stderr.is_empty() {
            format!("graphviz exited with {}", output.status)
        } else {
            stderr.to_string()
        }));
    }
    Ok(())
}
