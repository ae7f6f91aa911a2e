// Modules
pub mod assemble;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod layout;
pub mod parsers;
pub mod portal;
pub mod results;
pub mod runner;
pub mod summary;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::HarvestConfig;
pub use error::HarvestError;
pub use results::{LookupRequest, OutputRecord};
pub use runner::{NullProgress, Progress};
pub use summary::RunSummary;

use std::path::PathBuf;

use portal::WebPortal;

/// Main builder for a harvest run over one input file
pub struct Harvest {
    input: PathBuf,
    output: Option<PathBuf>,
    config: HarvestConfig,
}

/// What a finished run produced
#[derive(Debug)]
pub struct HarvestReport {
    pub summary: RunSummary,
    pub records: Vec<OutputRecord>,
    /// Where the CSV went, if it could be written
    pub output: Option<PathBuf>,
    /// Set when the browser session died and could not be replaced
    pub aborted: Option<String>,
}

impl Harvest {
    /// Create a new builder reading lookups from `input`
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            config: HarvestConfig::default(),
        }
    }

    /// Use `config` instead of the defaults
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Write the CSV here instead of a timestamped file in the working directory
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// The configuration the run will use
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run every lookup in the input file and export the records.
    ///
    /// Returns `Ok(None)` when the input has no usable rows; no browser is
    /// started in that case. An export failure is logged and leaves
    /// `output` unset so the collected records are still returned.
    pub async fn run<R>(self, progress: &mut R) -> Result<Option<HarvestReport>, HarvestError>
    where
        R: Progress + ?Sized,
    {
        self.config.validate()?;

        let requests = input::load_requests(&self.input)?;
        if requests.is_empty() {
            ::log::warn!("No bookings to process in {}", self.input.display());
            return Ok(None);
        }

        let timings = self.config.timings();
        let mut portal = WebPortal::connect(&self.config).await?;
        let report = runner::run_session(&mut portal, &requests, &timings, progress).await;

        let path = self
            .output
            .unwrap_or_else(|| utils::timestamped_output_path(chrono::Local::now()));
        let output = match export::export_csv(&path, &report.records) {
            Ok(()) => {
                ::log::info!("Results exported to {}", path.display());
                Some(path)
            }
            Err(e) => {
                ::log::error!("Failed to export results to {}: {}", path.display(), e);
                None
            }
        };

        Ok(Some(HarvestReport {
            summary: report.summary,
            records: report.records,
            output,
            aborted: report.aborted,
        }))
    }
}
