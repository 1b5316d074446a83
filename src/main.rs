//! CPU Temperature Exporter CLI
//!
//! Serves per-core CPU temperature aggregates as Prometheus gauges.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cpu_temp_exporter::exporter;

// =============================================================================
// CLI Arguments
// =============================================================================

/// CPU Temperature Prometheus Exporter
#[derive(Parser, Debug)]
#[command(name = "cpu-temp-exporter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the metrics HTTP server
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Enable verbose debug logging
    #[arg(long)]
    debug: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    exporter::run(args.port).await
}

/// Set up the log subscriber. `--debug` lowers the default level;
/// an explicit `RUST_LOG` still wins.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
