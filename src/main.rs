use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;

use booking_harvest::results::LookupRequest;
use booking_harvest::summary::LookupOutcome;
use booking_harvest::{Harvest, Progress, RunSummary};

mod args;
use args::Args;

/// Terminal progress bar for a run
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, total: usize) {
        self.bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("=> "));
        }
    }

    fn request_started(&mut self, _index: usize, request: &LookupRequest) {
        self.bar.set_message(request.reference.clone());
    }

    fn request_finished(&mut self, _index: usize, request: &LookupRequest, outcome: &LookupOutcome) {
        match outcome {
            LookupOutcome::Extracted { passengers } => self
                .bar
                .println(format!("{}: {} passenger(s)", request.reference, passengers)),
            LookupOutcome::NoPassengers => self
                .bar
                .println(format!("{}: flight details only", request.reference)),
            LookupOutcome::LoadFailed => self
                .bar
                .println(format!("{}: booking did not load", request.reference)),
            LookupOutcome::Errored(message) => self
                .bar
                .println(format!("{}: error: {}", request.reference, message)),
        }
        self.bar.inc(1);
    }

    fn finish(&mut self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match args.harvest_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut harvest = Harvest::new(&args.input).with_config(config);
    if let Some(output) = &args.output {
        harvest = harvest.with_output(output);
    }

    ::log::info!("Reading bookings from {}", args.input.display());
    println!("Note: lookups require a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL or --webdriver-url if not using {}",
        harvest.config().webdriver_url
    );

    let mut progress = BarProgress::new();
    match harvest.run(&mut progress).await {
        Ok(Some(report)) => {
            println!("{}", report.summary);
            match &report.output {
                Some(path) => println!("Results saved to {}", path.display()),
                None => println!("Results could not be saved"),
            }
            if let Some(reason) = &report.aborted {
                ::log::error!("Run stopped early: {}", reason);
                return ExitCode::FAILURE;
            }
            if report.output.is_none() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("No bookings to process");
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
