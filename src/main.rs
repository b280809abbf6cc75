use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use statsgraph::builder::BuildWarning;
use statsgraph::error::Result;
use statsgraph::filter::{ChunkFilter, ModuleFilter};
use statsgraph::logger;
use statsgraph::query::Direction;
use statsgraph::render::{self, OutputOptions, Renderable};
use statsgraph::session::{ExportQuery, ModuleQuery, Session};

#[derive(Parser)]
#[command(
    name = "statsgraph",
    version,
    about = "Module and chunk dependency graphs from bundler stats files"
)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a graph of chunk dependencies
    Chunks {
        /// Stats file written by the bundler
        stats: PathBuf,

        #[command(flatten)]
        chunks: ChunkArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Print the graph as JSON on stdout instead of rendering a file
        #[arg(long)]
        json: bool,
    },

    /// Generate a graph of module dependencies grouped by chunk
    Modules {
        /// Stats file written by the bundler
        stats: PathBuf,

        #[command(flatten)]
        chunks: ChunkArgs,

        /// Filter to modules whose id, identifier or name contains this text
        #[arg(long, short = 'm')]
        module_name: Option<String>,

        /// Which relatives of the matching modules to keep
        #[arg(long, short, value_enum, default_value_t = DirectionArg::Parents)]
        direction: DirectionArg,

        /// Keep modules without inclusion reasons as roots instead of failing
        #[arg(long)]
        allow_orphans: bool,

        #[command(flatten)]
        output: OutputArgs,

        /// Print the graph as JSON on stdout instead of rendering a file
        #[arg(long)]
        json: bool,
    },

    /// Export the module graph with entrypoints for an interactive viewer
    Export {
        /// Stats file written by the bundler
        stats: PathBuf,

        /// Filter to modules whose id, identifier or name contains this text
        #[arg(long, short = 'm')]
        module_name: Option<String>,

        /// Which relatives of the matching modules to keep
        #[arg(long, short, value_enum, default_value_t = DirectionArg::Children)]
        direction: DirectionArg,

        /// Write the JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ChunkArgs {
    /// Filter to a specific chunk id
    #[arg(long, short = 'c')]
    chunk_id: Option<String>,

    /// Filter to chunks emitting a file whose name contains this text
    #[arg(long, short = 'n')]
    chunk_filename: Option<String>,
}

impl From<ChunkArgs> for ChunkFilter {
    fn from(args: ChunkArgs) -> Self {
        Self {
            chunk_id: args.chunk_id,
            chunk_filename: args.chunk_filename,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format: dot, json, or any Graphviz format (svg, png, pdf, ...)
    #[arg(long, short, default_value = "svg")]
    format: String,

    /// Output path [default: ./graph.<format>]
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Graphviz executable used for formats other than dot and json
    #[arg(long, default_value = "dot", hide = true)]
    graphviz: PathBuf,
}

impl From<OutputArgs> for OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            format: args.format,
            path: args.output,
            graphviz: args.graphviz,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Parents,
    Children,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Parents => Self::Parents,
            DirectionArg::Children => Self::Children,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command, cli.quiet) {
        eprintln!("error: {e}");
        if let Some(hint) = e.hint() {
            eprintln!("hint: {hint}");
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, quiet: bool) -> Result<()> {
    match command {
        Commands::Chunks {
            stats,
            chunks,
            output,
            json,
        } => {
            let session = Session::open(&stats)?;
            let report = session.chunk_report(&chunks.into())?;
            if json {
                println!("{}", report.to_json()?);
                return Ok(());
            }
            if !quiet {
                print!("{}", report.to_terminal());
            }
            write_graph(&report, &output.into())
        }

        Commands::Modules {
            stats,
            chunks,
            module_name,
            direction,
            allow_orphans,
            output,
            json,
        } => {
            let session = Session::open(&stats)?;
            let query = ModuleQuery {
                chunks: chunks.into(),
                modules: ModuleFilter { module_name },
                direction: direction.into(),
                allow_orphans,
            };
            let analysis = session.module_report(&query)?;
            if !quiet {
                print_warning_summary(&analysis.warnings);
            }
            if json {
                println!("{}", analysis.report.to_json()?);
                return Ok(());
            }
            if !quiet {
                print!("{}", analysis.report.to_terminal());
            }
            write_graph(&analysis.report, &output.into())
        }

        Commands::Export {
            stats,
            module_name,
            direction,
            output,
        } => {
            let session = Session::open(&stats)?;
            let query = ExportQuery {
                modules: ModuleFilter { module_name },
                direction: direction.into(),
            };
            let analysis = session.export(&query)?;
            if !quiet {
                print_warning_summary(&analysis.warnings);
            }
            let json = analysis.report.to_json()?;
            match output {
                Some(path) => {
                    println!("Writing graph to {}", path.display());
                    render::write_file(&path, json.as_bytes())
                }
                None => {
                    println!("{json}");
                    Ok(())
                }
            }
        }
    }
}

fn write_graph(report: &impl Renderable, opts: &OutputOptions) -> Result<()> {
    println!("Writing graph to {}", opts.output_path().display());
    render::write_report(report, opts)?;
    Ok(())
}

fn print_warning_summary(warnings: &[BuildWarning]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!(
        "warning: {} build warning{} (run with --verbose for details)",
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" },
    );
}
