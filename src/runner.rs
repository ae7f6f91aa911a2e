use scraper::Html;
use tokio::time::{Instant, sleep, timeout};

use crate::assemble::{assemble_loaded, error_record, failure_record};
use crate::config::Timings;
use crate::error::HarvestError;
use crate::parsers::{LoadStatus, check_booking_loaded, extract_flight_details, extract_passenger_details};
use crate::portal::{BookingPortal, PageSnapshot};
use crate::results::{FlightRecord, LookupRequest, OutputRecord, PassengerRecord};
use crate::summary::{LookupOutcome, RunSummary};

/// Progress reporting for a harvest run. Front-ends implement this to
/// surface per-booking status to users.
pub trait Progress {
    /// Called once before the first lookup
    fn begin(&mut self, _total: usize) {}

    /// Called when lookup `index` (1-based) starts
    fn request_started(&mut self, _index: usize, _request: &LookupRequest) {}

    /// Called when lookup `index` has been recorded
    fn request_finished(&mut self, _index: usize, _request: &LookupRequest, _outcome: &LookupOutcome) {}

    /// Called at the end, successful or not
    fn finish(&mut self, _summary: &RunSummary) {}
}

/// A no-op progress sink
pub struct NullProgress;
impl Progress for NullProgress {}

/// Everything a run produced
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<OutputRecord>,
    pub outcomes: Vec<LookupOutcome>,
    pub summary: RunSummary,
    /// Set when the browser session died and could not be replaced
    pub aborted: Option<String>,
}

/// What one lookup yielded before records are assembled
enum Lookup {
    Loaded {
        flight: FlightRecord,
        passengers: Vec<PassengerRecord>,
    },
    LoadFailed,
}

/// Run every lookup on `portal`, then release the session.
///
/// The session is closed whatever happened during the run.
pub async fn run_session<P, R>(
    portal: &mut P,
    requests: &[LookupRequest],
    timings: &Timings,
    progress: &mut R,
) -> RunReport
where
    P: BookingPortal + ?Sized,
    R: Progress + ?Sized,
{
    let report = run_lookups(portal, requests, timings, progress).await;
    if let Err(e) = portal.close().await {
        ::log::warn!("Failed to close browser session: {}", e);
    }
    report
}

/// Process requests strictly one after another.
///
/// Every request ends up with at least one record: extracted rows, a
/// placeholder, a failure row or an error row.
pub async fn run_lookups<P, R>(
    portal: &mut P,
    requests: &[LookupRequest],
    timings: &Timings,
    progress: &mut R,
) -> RunReport
where
    P: BookingPortal + ?Sized,
    R: Progress + ?Sized,
{
    let started = Instant::now();
    let total = requests.len();
    let mut records = Vec::with_capacity(total);
    let mut outcomes = Vec::with_capacity(total);
    let mut aborted: Option<String> = None;

    progress.begin(total);
    ::log::info!("Processing {} bookings", total);

    for (i, request) in requests.iter().enumerate() {
        let index = i + 1;
        progress.request_started(index, request);
        ::log::info!("[{}/{}] Processing reference {}", index, total, request.reference);

        let (outcome, batch) = match aborted.clone() {
            Some(reason) => errored(request, &reason),
            None => {
                let result = match timeout(timings.request_timeout, lookup(portal, request, timings)).await {
                    Ok(result) => result,
                    Err(_) => Err(HarvestError::Timeout(timings.request_timeout)),
                };
                match result {
                    Ok(Lookup::Loaded { flight, passengers }) => {
                        let outcome = if passengers.is_empty() {
                            LookupOutcome::NoPassengers
                        } else {
                            LookupOutcome::Extracted {
                                passengers: passengers.len(),
                            }
                        };
                        (outcome, assemble_loaded(&flight, &passengers))
                    }
                    Ok(Lookup::LoadFailed) => {
                        ::log::warn!("Booking details not loaded for {}", request.reference);
                        (LookupOutcome::LoadFailed, vec![failure_record(request)])
                    }
                    Err(e) => {
                        ::log::error!("Failed to scrape booking {}: {}", request.reference, e);
                        if e.is_session_lost() {
                            aborted = recover_session(portal).await;
                        }
                        errored(request, &e.to_string())
                    }
                }
            }
        };

        records.extend(batch);
        progress.request_finished(index, request, &outcome);
        outcomes.push(outcome);

        if index < total && aborted.is_none() && !timings.request_delay.is_zero() {
            sleep(timings.request_delay).await;
        }
    }

    let summary = RunSummary::new(requests, &outcomes, &records, started.elapsed());
    ::log::info!(
        "Scraping completed: {}/{} successful, {} records",
        summary.successful,
        total,
        records.len()
    );
    progress.finish(&summary);

    RunReport {
        records,
        outcomes,
        summary,
        aborted,
    }
}

/// Navigate, submit, wait for the itinerary, then scrape it
async fn lookup<P>(portal: &mut P, request: &LookupRequest, timings: &Timings) -> Result<Lookup, HarvestError>
where
    P: BookingPortal + ?Sized,
{
    portal.submit_lookup(request).await?;

    let status = await_booking_loaded(portal, timings).await?;
    if !status.is_loaded() {
        return Ok(Lookup::LoadFailed);
    }
    ::log::info!("Booking details loaded for {}", request.reference);

    // Passenger blocks can render after the first itinerary region
    sleep(timings.settle).await;
    let snapshot = portal
        .snapshot()
        .await
        .map_err(|e| {
            if e.is_session_lost() {
                e
            } else {
                HarvestError::Extraction(e.to_string())
            }
        })?;

    let (flight, passengers) = extract(&snapshot, request);
    Ok(Lookup::Loaded { flight, passengers })
}

fn extract(snapshot: &PageSnapshot, request: &LookupRequest) -> (FlightRecord, Vec<PassengerRecord>) {
    let doc = Html::parse_document(&snapshot.html);
    let flight = extract_flight_details(&doc, request);
    let passengers = extract_passenger_details(&doc);
    (flight, passengers)
}

/// Poll the page until the itinerary shows, an error shows, or the load
/// timeout passes. A timeout reports `NotLoaded`.
pub async fn await_booking_loaded<P>(portal: &mut P, timings: &Timings) -> Result<LoadStatus, HarvestError>
where
    P: BookingPortal + ?Sized,
{
    let deadline = Instant::now() + timings.load_timeout;
    loop {
        let snapshot = portal.snapshot().await?;
        let status = check_booking_loaded(&snapshot);
        if status.is_final() {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            ::log::warn!("No itinerary after {:?} at {}", timings.load_timeout, snapshot.url);
            return Ok(LoadStatus::NotLoaded);
        }
        sleep(timings.poll_interval).await;
    }
}

/// Try once to replace a lost session. Returns the abort reason on failure.
async fn recover_session<P>(portal: &mut P) -> Option<String>
where
    P: BookingPortal + ?Sized,
{
    match portal.reconnect().await {
        Ok(()) => None,
        Err(e) => {
            ::log::error!("Failed to reconnect to WebDriver: {}", e);
            Some(format!("browser session lost: {}", e))
        }
    }
}

fn errored(request: &LookupRequest, message: &str) -> (LookupOutcome, Vec<OutputRecord>) {
    (
        LookupOutcome::Errored(message.to_string()),
        vec![error_record(request, message)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LOOKUP_URL;
    use crate::parsers::tests::fixtures::*;
    use crate::results::sentinel;
    use async_trait::async_trait;
    use fantoccini::error::{CmdError, ErrorStatus, WebDriver};
    use std::collections::HashMap;
    use std::time::Duration;

    /// How the fake site answers one reference
    #[derive(Clone)]
    enum Script {
        /// Successive pages after submitting; the last one repeats
        Pages(Vec<&'static str>),
        /// The form control is missing
        NoForm,
        /// The browser session is gone
        SessionLost,
        /// The driver reports the session id as unknown
        DriverGone,
        /// Submitting never returns
        Hang,
    }

    struct FakePortal {
        scripts: HashMap<&'static str, Script>,
        current: Vec<&'static str>,
        snapshots_taken: usize,
        reconnects: usize,
        reconnect_works: bool,
        closed: bool,
    }

    impl FakePortal {
        fn new(scripts: &[(&'static str, Script)]) -> Self {
            Self {
                scripts: scripts.iter().cloned().collect(),
                current: Vec::new(),
                snapshots_taken: 0,
                reconnects: 0,
                reconnect_works: true,
                closed: false,
            }
        }
    }

    #[async_trait]
    impl BookingPortal for FakePortal {
        async fn submit_lookup(&mut self, request: &LookupRequest) -> Result<(), HarvestError> {
            match self.scripts.get(request.reference.as_str()).cloned() {
                Some(Script::Pages(pages)) => {
                    self.current = pages;
                    Ok(())
                }
                Some(Script::NoForm) | None => Err(HarvestError::ElementNotFound("reference input")),
                Some(Script::SessionLost) => Err(HarvestError::Extraction(
                    "invalid session id".to_string(),
                )),
                Some(Script::DriverGone) => Err(CmdError::Standard(WebDriver::new(
                    ErrorStatus::InvalidSessionId,
                    "Tried to run command without establishing a connection",
                ))
                .into()),
                Some(Script::Hang) => {
                    sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }

        async fn snapshot(&mut self) -> Result<PageSnapshot, HarvestError> {
            self.snapshots_taken += 1;
            let html = if self.current.len() > 1 {
                self.current.remove(0)
            } else {
                self.current.first().copied().unwrap_or(BLANK_HTML)
            };
            Ok(PageSnapshot::new(LOOKUP_URL, html))
        }

        async fn reconnect(&mut self) -> Result<(), HarvestError> {
            self.reconnects += 1;
            if self.reconnect_works {
                Ok(())
            } else {
                Err(HarvestError::Config("driver gone".to_string()))
            }
        }

        async fn close(&mut self) -> Result<(), HarvestError> {
            self.closed = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        total: usize,
        started: Vec<usize>,
        finished: Vec<(String, LookupOutcome)>,
        summary: Option<RunSummary>,
    }

    impl Progress for Recorder {
        fn begin(&mut self, total: usize) {
            self.total = total;
        }
        fn request_started(&mut self, index: usize, _request: &LookupRequest) {
            self.started.push(index);
        }
        fn request_finished(&mut self, _index: usize, request: &LookupRequest, outcome: &LookupOutcome) {
            self.finished.push((request.reference.clone(), outcome.clone()));
        }
        fn finish(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }
    }

    fn timings() -> Timings {
        Timings {
            request_delay: Duration::from_secs(2),
            load_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            settle: Duration::from_millis(100),
            request_timeout: Duration::from_secs(60),
        }
    }

    fn requests(references: &[&str]) -> Vec<LookupRequest> {
        references
            .iter()
            .map(|r| LookupRequest::new(r, "Sharma", "B1"))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_request_is_recorded() {
        let mut portal = FakePortal::new(&[
            ("FULL01", Script::Pages(vec![ITINERARY_HTML])),
            ("EMPTY2", Script::Pages(vec![NO_PASSENGERS_HTML])),
            ("WRONG3", Script::Pages(vec![ERROR_HTML])),
            ("NOFRM4", Script::NoForm),
            ("SLOW05", Script::Pages(vec![LOOKUP_FORM_HTML])),
        ]);
        let reqs = requests(&["FULL01", "EMPTY2", "WRONG3", "NOFRM4", "SLOW05"]);
        let mut recorder = Recorder::default();

        let report = run_session(&mut portal, &reqs, &timings(), &mut recorder).await;

        assert!(portal.closed);
        assert!(report.aborted.is_none());
        assert_eq!(
            report.outcomes,
            vec![
                LookupOutcome::Extracted { passengers: 2 },
                LookupOutcome::NoPassengers,
                LookupOutcome::LoadFailed,
                LookupOutcome::Errored("could not find reference input".to_string()),
                LookupOutcome::LoadFailed,
            ]
        );

        // Two passengers, one placeholder, three single rows
        assert_eq!(report.records.len(), 6);
        assert!(report.records.len() >= reqs.len());
        for req in &reqs {
            assert!(report.records.iter().any(|r| r.reference == req.reference));
        }

        let placeholder = &report.records[2];
        assert_eq!(placeholder.reference, "EMPTY2");
        assert_eq!(placeholder.passenger_count, 0);
        assert_eq!(placeholder.name, sentinel::NO_PASSENGERS);

        assert_eq!(report.records[3].source, sentinel::FAILED_TO_LOAD);
        assert_eq!(report.records[4].source, "Error: could not find reference input");

        assert_eq!(recorder.total, 5);
        assert_eq!(recorder.started, vec![1, 2, 3, 4, 5]);
        assert_eq!(recorder.finished.len(), 5);
        let summary = recorder.summary.unwrap();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.records, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_once_itinerary_shows() {
        let mut portal = FakePortal::new(&[(
            "LATE01",
            Script::Pages(vec![LOOKUP_FORM_HTML, BLANK_HTML, ITINERARY_HTML]),
        )]);
        let report = run_lookups(&mut portal, &requests(&["LATE01"]), &timings(), &mut NullProgress).await;

        assert_eq!(report.outcomes, vec![LookupOutcome::Extracted { passengers: 2 }]);
        // Three polls plus the extraction snapshot
        assert_eq!(portal.snapshots_taken, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_gives_up_after_load_timeout() {
        let mut portal = FakePortal::new(&[]);
        portal.current = vec![BLANK_HTML];
        let t = timings();
        let started = Instant::now();

        let status = await_booking_loaded(&mut portal, &t).await.unwrap();

        assert_eq!(status, LoadStatus::NotLoaded);
        assert!(started.elapsed() >= t.load_timeout);
        assert!(started.elapsed() < t.load_timeout + t.poll_interval * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_request_times_out_into_error_record() {
        let mut portal = FakePortal::new(&[
            ("HANG01", Script::Hang),
            ("FULL02", Script::Pages(vec![ITINERARY_HTML])),
        ]);
        let report = run_lookups(
            &mut portal,
            &requests(&["HANG01", "FULL02"]),
            &timings(),
            &mut NullProgress,
        )
        .await;

        assert!(matches!(report.outcomes[0], LookupOutcome::Errored(_)));
        assert!(report.records[0].source.starts_with("Error: lookup timed out"));
        assert_eq!(report.outcomes[1], LookupOutcome::Extracted { passengers: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_requests_only() {
        let mut portal = FakePortal::new(&[
            ("A00001", Script::Pages(vec![ERROR_HTML])),
            ("B00002", Script::Pages(vec![ERROR_HTML])),
            ("C00003", Script::Pages(vec![ERROR_HTML])),
        ]);
        let t = Timings {
            settle: Duration::ZERO,
            ..timings()
        };
        let started = Instant::now();

        run_lookups(&mut portal, &requests(&["A00001", "B00002", "C00003"]), &t, &mut NullProgress).await;

        // Error pages resolve on the first poll, so only the delays take time
        assert_eq!(started.elapsed(), t.request_delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_session_is_reconnected() {
        let mut portal = FakePortal::new(&[
            ("LOST01", Script::SessionLost),
            ("FULL02", Script::Pages(vec![ITINERARY_HTML])),
        ]);
        let report = run_lookups(
            &mut portal,
            &requests(&["LOST01", "FULL02"]),
            &timings(),
            &mut NullProgress,
        )
        .await;

        assert_eq!(portal.reconnects, 1);
        assert!(report.aborted.is_none());
        assert_eq!(report.outcomes[1], LookupOutcome::Extracted { passengers: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_reported_session_loss_is_reconnected() {
        let mut portal = FakePortal::new(&[
            ("GONE01", Script::DriverGone),
            ("FULL02", Script::Pages(vec![ITINERARY_HTML])),
        ]);
        let report = run_lookups(
            &mut portal,
            &requests(&["GONE01", "FULL02"]),
            &timings(),
            &mut NullProgress,
        )
        .await;

        assert_eq!(portal.reconnects, 1);
        assert!(report.aborted.is_none());
        assert!(matches!(report.outcomes[0], LookupOutcome::Errored(_)));
        assert_eq!(report.outcomes[1], LookupOutcome::Extracted { passengers: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecoverable_session_records_remaining_requests() {
        let mut portal = FakePortal::new(&[
            ("LOST01", Script::SessionLost),
            ("FULL02", Script::Pages(vec![ITINERARY_HTML])),
            ("FULL03", Script::Pages(vec![ITINERARY_HTML])),
        ]);
        portal.reconnect_works = false;
        let reqs = requests(&["LOST01", "FULL02", "FULL03"]);

        let report = run_session(&mut portal, &reqs, &timings(), &mut NullProgress).await;

        assert!(portal.closed);
        assert_eq!(portal.reconnects, 1);
        assert!(report.aborted.as_deref().unwrap().starts_with("browser session lost"));
        assert_eq!(report.records.len(), 3);
        assert!(report.outcomes.iter().all(|o| matches!(o, LookupOutcome::Errored(_))));
        assert_eq!(report.records[2].reference, "FULL03");
        assert_eq!(report.records[2].flight_status, sentinel::ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_request_list() {
        let mut portal = FakePortal::new(&[]);
        let report = run_session(&mut portal, &[], &timings(), &mut NullProgress).await;

        assert!(report.records.is_empty());
        assert!(portal.closed);
    }
}
