use clap::Parser;
use std::path::PathBuf;

use booking_harvest::HarvestConfig;
use booking_harvest::HarvestError;

#[derive(Parser, Debug)]
#[command(name = "booking-harvest")]
#[command(about = "Look up airline bookings in a browser and export passenger details to CSV")]
#[command(version)]
pub struct Args {
    /// CSV of bookings: reference, surname, secondary code (first row is a header)
    pub input: PathBuf,

    /// Output CSV path (default: booking_details_<timestamp>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Seconds to wait between lookups
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(0..=60))]
    pub delay: Option<u64>,

    /// WebDriver URL (overrides WEBDRIVER_URL and the config file)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Seconds to wait for the itinerary after submitting
    #[arg(long)]
    pub load_timeout: Option<u64>,
}

impl Args {
    /// Build the run configuration: file or defaults, then environment, then flags
    pub fn harvest_config(&self) -> Result<HarvestConfig, HarvestError> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        }
        .with_env_overrides();

        if self.headed {
            config.headless = false;
        }
        if let Some(delay) = self.delay {
            config.request_delay_secs = delay;
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(timeout) = self.load_timeout {
            config.load_timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }
}
