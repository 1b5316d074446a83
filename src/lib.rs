//! CPU Temperature Exporter Library
//!
//! A small Prometheus exporter for per-core CPU temperatures.
//!
//! # Features
//!
//! - Per-core readings via `sensors` (Linux) or OpenHardwareMonitor (Windows)
//! - Aggregate statistics: core count, max, min, avg
//! - Pull-based `/metrics` endpoint refreshed every 10 seconds
//!
//! # Example
//!
//! ```no_run
//! use cpu_temp_exporter::source;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Pick the source for the host OS and read one round of stats
//!     let source = source::resolve_host()?;
//!     source.ensure_ready().await?;
//!     let stats = source.fetch().await?;
//!     println!("{}", stats);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod exporter;
pub mod source;
pub mod stats;

// Re-exports for convenience
pub use error::{ExporterError, Result};
pub use source::TemperatureSource;
pub use stats::CpuStats;
