//! Diagnostic logging on stderr.
//!
//! Reports go to stdout or the output file; everything written through
//! `tracing` lands on stderr so it never mixes into piped JSON.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, before anything logs.
///
/// `--verbose` wins over `--quiet`. Without either flag `RUST_LOG` is
/// honoured, falling back to warnings only.
pub fn init_logger(verbose: bool, quiet: bool) {
    init_logger_with_filter(filter_for(verbose, quiet));
}

fn init_logger_with_filter(filter: EnvFilter) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("statsgraph=debug")
    } else if quiet {
        EnvFilter::new("statsgraph=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statsgraph=warn"))
    }
}
