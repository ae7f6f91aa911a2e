use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::HarvestError;
use crate::layout;

/// Longest accepted pause between two lookups
pub const MAX_REQUEST_DELAY_SECS: u64 = 60;

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Page holding the booking lookup form
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent the browser reports
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser window size as `width,height`
    #[serde(default = "default_window_size")]
    pub window_size: String,

    /// Pause between two lookups, in seconds
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,

    /// Browser page-load timeout, in seconds
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// How long to keep looking for a form control, in seconds
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,

    /// How long to wait for the itinerary after submitting, in seconds
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Delay between two looks at the page while waiting, in milliseconds
    #[serde(default = "default_poll_interval_millis")]
    pub poll_interval_millis: u64,

    /// Pause after navigating and after submitting, in milliseconds
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,

    /// Upper bound for one whole lookup, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Waits and delays used by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub request_delay: Duration,
    pub load_timeout: Duration,
    pub poll_interval: Duration,
    pub settle: Duration,
    pub request_timeout: Duration,
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, HarvestError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the WebDriver URL with `WEBDRIVER_URL` if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Reject values the run loop cannot work with
    pub fn validate(&self) -> Result<(), HarvestError> {
        for (name, value) in [
            ("lookup_url", &self.lookup_url),
            ("webdriver_url", &self.webdriver_url),
        ] {
            Url::parse(value)
                .map_err(|e| HarvestError::Config(format!("{} `{}`: {}", name, value, e)))?;
        }

        if self.request_delay_secs > MAX_REQUEST_DELAY_SECS {
            return Err(HarvestError::Config(format!(
                "request_delay_secs must be at most {}, got {}",
                MAX_REQUEST_DELAY_SECS, self.request_delay_secs
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(HarvestError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.load_timeout_secs > self.request_timeout_secs {
            return Err(HarvestError::Config(format!(
                "load_timeout_secs ({}) must not exceed request_timeout_secs ({})",
                self.load_timeout_secs, self.request_timeout_secs
            )));
        }

        if self.poll_interval_millis == 0 {
            return Err(HarvestError::Config(
                "poll_interval_millis must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timings(&self) -> Timings {
        Timings {
            request_delay: Duration::from_secs(self.request_delay_secs),
            load_timeout: Duration::from_secs(self.load_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_millis),
            settle: Duration::from_millis(self.settle_millis),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_lookup_url(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            window_size: default_window_size(),
            request_delay_secs: default_request_delay_secs(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            element_timeout_secs: default_element_timeout_secs(),
            load_timeout_secs: default_load_timeout_secs(),
            poll_interval_millis: default_poll_interval_millis(),
            settle_millis: default_settle_millis(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_lookup_url() -> String {
    layout::LOOKUP_URL.to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_window_size() -> String {
    "1920,1080".to_string()
}

fn default_request_delay_secs() -> u64 {
    2
}

fn default_page_load_timeout_secs() -> u64 {
    20
}

fn default_element_timeout_secs() -> u64 {
    10
}

fn default_load_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_millis() -> u64 {
    500
}

fn default_settle_millis() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = HarvestConfig::from_json("{}").unwrap();
        assert_eq!(config.lookup_url, layout::LOOKUP_URL);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert!(config.headless);
        assert_eq!(config.timings().request_delay, Duration::from_secs(2));
        assert_eq!(config.page_load_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            HarvestConfig::from_json(r#"{"headless": false, "request_delay_secs": 5}"#).unwrap();
        assert!(!config.headless);
        assert_eq!(config.request_delay_secs, 5);
        assert_eq!(config.load_timeout_secs, 10);
    }

    #[test]
    fn test_out_of_range_delay_is_rejected() {
        let err = HarvestConfig::from_json(r#"{"request_delay_secs": 600}"#).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let err = HarvestConfig::from_json(r#"{"webdriver_url": "not a url"}"#).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }

    #[test]
    fn test_timeouts_must_fit_inside_request_timeout() {
        let zero = HarvestConfig::from_json(r#"{"request_timeout_secs": 0}"#).unwrap_err();
        assert!(matches!(zero, HarvestError::Config(_)));

        let too_long = HarvestConfig::from_json(
            r#"{"load_timeout_secs": 90, "request_timeout_secs": 60}"#,
        )
        .unwrap_err();
        assert!(matches!(too_long, HarvestError::Config(_)));

        let equal = HarvestConfig::from_json(
            r#"{"load_timeout_secs": 60, "request_timeout_secs": 60}"#,
        );
        assert!(equal.is_ok());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            HarvestConfig::from_json("{").unwrap_err(),
            HarvestError::Json(_)
        ));
    }
}
