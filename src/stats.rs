//! Aggregate statistics over per-core temperature readings.
//!
//! A set of raw readings is collected once per poll cycle and summarised
//! into a count/max/min/avg record that feeds the Prometheus gauges.

use crate::error::{ExporterError, Result};

/// Aggregate CPU temperature statistics for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuStats {
    /// Number of core readings that went into the aggregate.
    pub core_count: usize,
    /// Hottest core in degrees Celsius.
    pub max: f64,
    /// Coolest core in degrees Celsius.
    pub min: f64,
    /// Mean temperature across all cores.
    pub avg: f64,
}

impl CpuStats {
    /// Compute aggregate statistics from raw per-core readings.
    ///
    /// Max and min come from a single linear scan; avg is the plain
    /// floating-point mean. An empty slice is an error, never a
    /// zero-valued record.
    pub fn from_readings(readings: &[f64]) -> Result<Self> {
        let first = *readings.first().ok_or(ExporterError::NoData)?;

        let mut max = first;
        let mut min = first;
        let mut sum = 0.0;
        for &reading in readings {
            if reading > max {
                max = reading;
            }
            if reading < min {
                min = reading;
            }
            sum += reading;
        }

        Ok(Self {
            core_count: readings.len(),
            max,
            min,
            avg: sum / readings.len() as f64,
        })
    }
}

impl std::fmt::Display for CpuStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cores={} max={:.2} min={:.2} avg={:.2}",
            self.core_count, self.max, self.min, self.avg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_aggregate() {
        let stats = CpuStats::from_readings(&[45.0, 50.0, 55.0]).unwrap();
        assert_eq!(stats.core_count, 3);
        assert_eq!(stats.min, 45.0);
        assert_eq!(stats.max, 55.0);
        assert_eq!(stats.avg, 50.0);
    }

    #[test]
    fn test_single_reading() {
        let stats = CpuStats::from_readings(&[62.5]).unwrap();
        assert_eq!(stats.core_count, 1);
        assert_eq!(stats.min, 62.5);
        assert_eq!(stats.max, 62.5);
        assert_eq!(stats.avg, 62.5);
    }

    #[test]
    fn test_min_avg_max_ordering() {
        let samples: &[&[f64]] = &[
            &[30.0, 90.0],
            &[41.2, 41.3, 41.1, 58.0],
            &[70.0, 70.0, 70.0],
            &[-5.0, 12.5, 3.0],
        ];
        for readings in samples {
            let stats = CpuStats::from_readings(readings).unwrap();
            assert!(stats.min <= stats.avg, "min > avg for {:?}", readings);
            assert!(stats.avg <= stats.max, "avg > max for {:?}", readings);
            assert_eq!(stats.core_count, readings.len());
        }
    }

    #[test]
    fn test_empty_readings_is_error() {
        let err = CpuStats::from_readings(&[]).unwrap_err();
        assert!(matches!(err, ExporterError::NoData));
    }

    #[test]
    fn test_unordered_input() {
        let stats = CpuStats::from_readings(&[55.0, 45.0, 50.0]).unwrap();
        assert_eq!(stats.min, 45.0);
        assert_eq!(stats.max, 55.0);
    }
}
