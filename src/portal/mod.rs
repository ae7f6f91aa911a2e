pub mod web;

use async_trait::async_trait;

use crate::error::HarvestError;
use crate::results::LookupRequest;

pub use web::WebPortal;

/// The page as it stood at one moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Current URL of the page
    pub url: String,

    /// Rendered HTML source
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// A browser session able to run booking lookups.
///
/// The run loop owns the portal exclusively and drives one lookup at a time.
#[async_trait]
pub trait BookingPortal: Send {
    /// Open the lookup form, fill it in for `request` and submit it
    async fn submit_lookup(&mut self, request: &LookupRequest) -> Result<(), HarvestError>;

    /// Capture the current page
    async fn snapshot(&mut self) -> Result<PageSnapshot, HarvestError>;

    /// Replace a lost session with a fresh one
    async fn reconnect(&mut self) -> Result<(), HarvestError>;

    /// Release the session
    async fn close(&mut self) -> Result<(), HarvestError>;
}
