use std::time::Duration;

use thiserror::Error;

/// Driver messages that mean the session no longer exists
const SESSION_LOST_MESSAGES: [&str; 3] = [
    "Unable to find session",
    "invalid session id",
    "session deleted",
];

/// Errors raised while harvesting bookings.
///
/// Only `Validation`, `Config` and session setup failures stop a run. Everything
/// else is caught per request by the run loop and turned into an error record.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The input file is unusable (e.g. fewer than three columns)
    #[error("invalid input: {0}")]
    Validation(String),

    /// The configuration file or a configured value is unusable
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No candidate in a selector chain matched an interactable element
    #[error("could not find {0}")]
    ElementNotFound(&'static str),

    /// Reading a page that had already loaded failed
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// A single lookup ran past its time budget
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error(transparent)]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HarvestError {
    /// Whether the WebDriver session behind this error is gone for good.
    ///
    /// Driver errors are classified by their status code. Errors that were
    /// already flattened into text fall back to a message check.
    pub fn is_session_lost(&self) -> bool {
        match self {
            HarvestError::WebDriver(e) => {
                e.is_invalid_session_id() || mentions_lost_session(&e.to_string())
            }
            HarvestError::Extraction(message) => mentions_lost_session(message),
            _ => false,
        }
    }
}

fn mentions_lost_session(message: &str) -> bool {
    SESSION_LOST_MESSAGES
        .iter()
        .any(|pattern| message.contains(pattern))
}
