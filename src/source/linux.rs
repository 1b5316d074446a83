//! Linux temperature source backed by the lm-sensors `sensors` command.
//!
//! Runs `sensors`, scans stdout for per-core lines and extracts the
//! current reading from each. A typical matching line looks like:
//!
//! ```text
//! Core 0:        +45.0°C  (high = +80.0°C, crit = +100.0°C)
//! ```

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ExporterError, Result};
use crate::source::TemperatureSource;
use crate::stats::CpuStats;

/// Install location checked at startup.
pub const SENSORS_PATH: &str = "/usr/bin/sensors";

/// Per-core lines start with this label prefix.
const CORE_PREFIX: &str = "Core ";

/// Matches the current reading, e.g. `+45.0°C`. The first match on a core
/// line is the reading; the high/crit thresholds come later on the line.
static TEMPERATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+\d+\.\d+°C").expect("temperature regex is valid"));

/// Temperature source that shells out to `sensors`.
#[derive(Debug)]
pub struct SensorsSource;

impl SensorsSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SensorsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemperatureSource for SensorsSource {
    fn name(&self) -> &'static str {
        "sensors"
    }

    async fn ensure_ready(&self) -> Result<()> {
        let path = Path::new(SENSORS_PATH);
        if path.is_file() {
            debug!("found sensors at {}", SENSORS_PATH);
            Ok(())
        } else {
            Err(ExporterError::ToolNotFound("sensors".to_string()))
        }
    }

    async fn fetch(&self) -> Result<CpuStats> {
        let output = Command::new("sensors").output().await.map_err(|err| {
            ExporterError::ToolExecution {
                tool: "sensors".to_string(),
                message: err.to_string(),
            }
        })?;

        if !output.status.success() {
            return Err(ExporterError::ToolExecution {
                tool: "sensors".to_string(),
                message: format!("exited with {}", output.status),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let readings = parse_sensors_output(&text);
        debug!("parsed {} core readings from sensors", readings.len());
        CpuStats::from_readings(&readings)
    }
}

/// Extract per-core readings from `sensors` stdout.
///
/// Only lines starting with `Core ` are considered; lines without a
/// temperature match are ignored.
pub fn parse_sensors_output(text: &str) -> Vec<f64> {
    text.lines()
        .filter(|line| line.starts_with(CORE_PREFIX))
        .filter_map(|line| TEMPERATURE_RE.find(line))
        .filter_map(|m| {
            m.as_str()
                .trim_start_matches('+')
                .trim_end_matches("°C")
                .parse::<f64>()
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OUTPUT: &str = "\
coretemp-isa-0000
Adapter: ISA adapter
Package id 0:  +52.0°C  (high = +80.0°C, crit = +100.0°C)
Core 0:        +45.0°C  (high = +80.0°C, crit = +100.0°C)
Core 1:        +50.0°C  (high = +80.0°C, crit = +100.0°C)
Core 2:        +55.0°C  (high = +80.0°C, crit = +100.0°C)

acpitz-acpi-0
Adapter: ACPI interface
temp1:         +48.5°C
";

    #[test]
    fn test_parse_three_cores() {
        let readings = parse_sensors_output(SAMPLE_OUTPUT);
        assert_eq!(readings, vec![45.0, 50.0, 55.0]);
    }

    #[test]
    fn test_scenario_aggregate() {
        let readings = parse_sensors_output(SAMPLE_OUTPUT);
        let stats = CpuStats::from_readings(&readings).unwrap();
        assert_eq!(stats.core_count, 3);
        assert_eq!(stats.min, 45.0);
        assert_eq!(stats.max, 55.0);
        assert_eq!(stats.avg, 50.0);
    }

    #[test]
    fn test_package_line_excluded() {
        // "Package id 0" carries a temperature but is not a core line.
        let readings = parse_sensors_output("Package id 0:  +52.0°C\n");
        assert!(readings.is_empty());
    }

    #[test]
    fn test_core_line_without_reading_ignored() {
        let readings = parse_sensors_output("Core 0: N/A\nCore 1: +41.0°C\n");
        assert_eq!(readings, vec![41.0]);
    }

    #[test]
    fn test_empty_output_yields_no_data() {
        let readings = parse_sensors_output("");
        let err = CpuStats::from_readings(&readings).unwrap_err();
        assert!(matches!(err, ExporterError::NoData));
    }
}
