//! Custom error types for temperature collection.
//!
//! This module provides fine-grained error handling for the OS collaborator
//! tools, the monitor bridge HTTP polling, and aggregate computation.

use thiserror::Error;

/// Main error type for exporter operations.
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Required OS collaborator tool is missing at startup.
    #[error("required tool not found: {0}")]
    ToolNotFound(String),

    /// Collaborator tool is present but could not run to completion.
    #[error("failed to run {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    /// Helper process never answered on its endpoint within the retry budget.
    #[error("{tool} did not respond after {attempts} attempts")]
    ToolStartupTimeout { tool: String, attempts: u32 },

    /// Collaborator ran but produced no parseable core reading.
    #[error("no CPU core temperature readings found")]
    NoData,

    /// Host OS is not one of the two supported platforms.
    #[error("unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    /// HTTP request to the monitor endpoint failed.
    #[error("monitor request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Monitor endpoint answered with something other than 200.
    #[error("monitor endpoint returned status {0}")]
    MonitorStatus(reqwest::StatusCode),

    /// Monitor endpoint returned a body that is not the expected node tree.
    #[error("invalid monitor response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// Filesystem or process I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;
