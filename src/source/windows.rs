//! Windows temperature source backed by OpenHardwareMonitor.
//!
//! OpenHardwareMonitor has no CLI output, but its built-in web server
//! exposes the whole sensor tree as JSON on a fixed local port. This
//! source launches the helper at startup, waits (with bounded retries)
//! for the endpoint to come up, and then reads the tree once per fetch,
//! collecting the per-core leaves under each "Temperatures" node.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::error::{ExporterError, Result};
use crate::source::TemperatureSource;
use crate::stats::CpuStats;

/// Fixed local endpoint served by OpenHardwareMonitor's web server.
pub const DATA_URL: &str = "http://127.0.0.1:8085/data.json";

/// Display name of the helper tool, used in errors and logs.
const TOOL_NAME: &str = "OpenHardwareMonitor";

/// Helper executable location, relative to the install candidates.
const HELPER_REL_PATH: &[&str] = &["tools", "OpenHardwareMonitor", "OpenHardwareMonitor.exe"];

/// Sensor-tree node label that groups temperature leaves.
const TEMPERATURES_LABEL: &str = "Temperatures";

/// Per-core leaves are named `CPU Core #1`, `CPU Core #2`, ...
/// `CPU Package` and other siblings are deliberately excluded.
const CORE_PREFIX: &str = "CPU Core #";

/// Unit suffix carried by leaf values, e.g. `"45.0 °C"`.
const UNIT_SUFFIX: &str = " °C";

// =============================================================================
// Retry Policy
// =============================================================================

/// Bounded-retry policy for the one-time startup wait.
///
/// The helper takes a few seconds to enumerate hardware before its web
/// server answers, so the first requests after launch are expected to fail.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Number of polling attempts before giving up.
    pub max_attempts: u32,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Sleep before each attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// 10 attempts, 1 s apart, 1 s timeout each: ~10 s worst-case wait.
    fn default() -> Self {
        Self {
            max_attempts: 10,
            timeout: Duration::from_secs(1),
            delay: Duration::from_secs(1),
        }
    }
}

// =============================================================================
// Sensor Tree
// =============================================================================

/// One node of the OpenHardwareMonitor sensor tree.
///
/// The wire shape also carries `id`, `Min`, `Max` and `ImageURL`, which
/// this source does not consume.
#[derive(Debug, Deserialize)]
pub struct Node {
    #[serde(rename = "Text", default)]
    pub text: String,
    #[serde(rename = "Value", default)]
    pub value: String,
    #[serde(rename = "Children", default)]
    pub children: Vec<Node>,
}

/// Depth-first walk collecting per-core readings.
///
/// Whenever a node is labeled "Temperatures", its immediate children with
/// a `CPU Core #` label are parsed (unit suffix stripped); unparseable
/// values are skipped. The walk continues into every child, so multiple
/// "Temperatures" groups (one per hardware node) all contribute.
pub fn collect_core_temperatures(node: &Node, readings: &mut Vec<f64>) {
    if node.text == TEMPERATURES_LABEL {
        for child in &node.children {
            if child.text.starts_with(CORE_PREFIX) {
                let raw = child.value.strip_suffix(UNIT_SUFFIX).unwrap_or(&child.value);
                if let Ok(temp) = raw.parse::<f64>() {
                    readings.push(temp);
                }
            }
        }
    }
    for child in &node.children {
        collect_core_temperatures(child, readings);
    }
}

// =============================================================================
// Monitor Bridge
// =============================================================================

/// Temperature source that polls the OpenHardwareMonitor JSON endpoint.
#[derive(Debug)]
pub struct MonitorBridge {
    endpoint: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl MonitorBridge {
    /// Bridge against the fixed local endpoint with the default policy.
    pub fn new() -> Self {
        Self::with_endpoint(DATA_URL, RetryPolicy::default())
    }

    /// Bridge against a custom endpoint, mainly for tests.
    pub fn with_endpoint(endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            retry,
        }
    }

    /// Directories searched for the helper executable: next to the running
    /// binary, then the current working directory.
    fn helper_candidates() -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();

        let exe = std::env::current_exe()?;
        if let Some(dir) = exe.parent() {
            candidates.push(Self::helper_path(dir.to_path_buf()));
        }
        candidates.push(Self::helper_path(std::env::current_dir()?));

        Ok(candidates)
    }

    fn helper_path(mut base: PathBuf) -> PathBuf {
        for part in HELPER_REL_PATH {
            base.push(part);
        }
        base
    }

    /// Locate the helper executable at one of the install candidates.
    pub fn find_helper() -> Result<PathBuf> {
        for candidate in Self::helper_candidates()? {
            if candidate.is_file() {
                debug!("found {} at {}", TOOL_NAME, candidate.display());
                return Ok(candidate);
            }
        }
        Err(ExporterError::ToolNotFound(TOOL_NAME.to_string()))
    }

    /// Launch the helper fire-and-forget.
    ///
    /// An unclean exit of the helper takes the whole exporter down, since
    /// every later fetch would fail anyway.
    fn spawn_helper(path: &Path) -> Result<()> {
        let mut child = tokio::process::Command::new(path)
            .spawn()
            .map_err(|err| ExporterError::ToolExecution {
                tool: TOOL_NAME.to_string(),
                message: err.to_string(),
            })?;

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    warn!("{} exited", TOOL_NAME);
                }
                Ok(status) => {
                    error!("{} exited with {}", TOOL_NAME, status);
                    std::process::exit(1);
                }
                Err(err) => {
                    error!("waiting on {}: {}", TOOL_NAME, err);
                    std::process::exit(1);
                }
            }
        });

        Ok(())
    }

    /// Poll the endpoint until it answers 200 or the retry budget runs out.
    pub async fn wait_until_ready(&self) -> Result<()> {
        debug!("waiting for {} on {}", TOOL_NAME, self.endpoint);
        for attempt in 1..=self.retry.max_attempts {
            tokio::time::sleep(self.retry.delay).await;

            let response = self
                .client
                .get(&self.endpoint)
                .timeout(self.retry.timeout)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                    debug!("attempt {}: {} is up", attempt, TOOL_NAME);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("attempt {}: {} returned {}", attempt, TOOL_NAME, resp.status());
                }
                Err(err) => {
                    warn!("attempt {}: {}", attempt, err);
                }
            }
        }
        Err(ExporterError::ToolStartupTimeout {
            tool: TOOL_NAME.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}

impl Default for MonitorBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemperatureSource for MonitorBridge {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    async fn ensure_ready(&self) -> Result<()> {
        let helper = Self::find_helper()?;
        Self::spawn_helper(&helper)?;
        self.wait_until_ready().await
    }

    async fn fetch(&self) -> Result<CpuStats> {
        let response = self.client.get(&self.endpoint).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(ExporterError::MonitorStatus(response.status()));
        }

        let body = response.text().await?;
        let root: Node = serde_json::from_str(&body)?;

        let mut readings = Vec::new();
        collect_core_temperatures(&root, &mut readings);
        debug!("collected {} core readings from {}", readings.len(), TOOL_NAME);
        CpuStats::from_readings(&readings)
    }
}
