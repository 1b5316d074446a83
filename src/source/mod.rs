//! Temperature sources and OS-based source selection.
//!
//! One capability (fetch aggregate CPU temperatures), two platform
//! implementations: parsing `sensors` output on Linux and polling the
//! OpenHardwareMonitor JSON endpoint on Windows. The source is resolved
//! once at startup from the host OS identifier.

pub mod linux;
pub mod windows;

use async_trait::async_trait;

use crate::error::{ExporterError, Result};
use crate::stats::CpuStats;

pub use linux::SensorsSource;
pub use windows::MonitorBridge;

/// A platform-specific way of reading per-core CPU temperatures.
#[async_trait]
pub trait TemperatureSource: Send + Sync + std::fmt::Debug {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// One-time startup check: verify the OS collaborator tool exists and,
    /// where needed, bring it up. Called once before the first fetch.
    async fn ensure_ready(&self) -> Result<()>;

    /// Collect one round of readings and aggregate them.
    async fn fetch(&self) -> Result<CpuStats>;
}

/// Select the temperature source for the given OS identifier.
///
/// Pure function of the identifier (as in `std::env::consts::OS`):
/// `"linux"` and `"windows"` map to the two implementations, anything
/// else is unsupported.
pub fn resolve(os: &str) -> Result<Box<dyn TemperatureSource>> {
    match os {
        "linux" => Ok(Box::new(SensorsSource::new())),
        "windows" => Ok(Box::new(MonitorBridge::new())),
        other => Err(ExporterError::UnsupportedPlatform(other.to_string())),
    }
}

/// Resolve the source for the host OS.
pub fn resolve_host() -> Result<Box<dyn TemperatureSource>> {
    resolve(std::env::consts::OS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_linux() {
        let source = resolve("linux").unwrap();
        assert_eq!(source.name(), "sensors");
    }

    #[test]
    fn test_resolve_windows() {
        let source = resolve("windows").unwrap();
        assert_eq!(source.name(), "OpenHardwareMonitor");
    }

    #[test]
    fn test_resolve_unsupported() {
        for os in ["macos", "freebsd", "android", ""] {
            let err = resolve(os).unwrap_err();
            assert!(
                matches!(&err, ExporterError::UnsupportedPlatform(name) if name == os),
                "expected UnsupportedPlatform for {:?}, got {:?}",
                os,
                err
            );
        }
    }
}
