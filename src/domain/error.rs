use std::io;

use thiserror::Error;

use crate::domain::transfer::TransferIssue;

/// Library-wide error type for landingzones operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure with the affected path.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Config file exists but cannot be parsed.
    #[error("Malformed config file {path}: {reason}")]
    MalformedConfig { path: String, reason: String },

    /// Transfers file is absent entirely.
    #[error("Transfers file not found: {0}")]
    TransfersFileMissing(String),

    /// Header row does not match the recognized column set.
    #[error("Invalid transfers header: {0}")]
    ConfigFormat(String),

    /// One or more rows failed validation. Collected across the whole file
    /// so a single run surfaces every problem.
    #[error("Invalid transfers configuration:\n{}", format_issues(.0))]
    InvalidTransfers(Vec<TransferIssue>),

    /// A value cannot be placed safely on a cron line.
    #[error("Cannot render {field} for route {route}: {reason}")]
    Unrenderable {
        route: String,
        field: &'static str,
        reason: String,
    },

    /// One or more output files could not be written or removed.
    #[error("Failed to update cron files:\n{}", .0.join("\n"))]
    WriteFailures(Vec<String>),
}

impl AppError {
    pub(crate) fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        AppError::Io { path: path.into(), source }
    }
}

fn format_issues(issues: &[TransferIssue]) -> String {
    issues.iter().map(|issue| format!("  {issue}")).collect::<Vec<_>>().join("\n")
}
