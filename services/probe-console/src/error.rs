//! Error types for the probe console

use crate::model::MonitorKind;

/// Errors that can occur in the probe console
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid tag '{0}', expected key:value")]
    InvalidTag(String),

    #[error("Invalid selection key '{0}', expected probe:<name> or story:<name>")]
    InvalidSelectionKey(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory load failed: {0}")]
    DirectoryLoad(String),

    #[error("Fetching results for {kind} '{name}' failed: {reason}")]
    ResultFetch {
        kind: MonitorKind,
        name: String,
        reason: String,
    },

    #[error("Bulk trigger failed: {0}")]
    BulkTrigger(String),
}

/// Result type alias for probe console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
