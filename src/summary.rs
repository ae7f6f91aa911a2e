use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::results::{LookupRequest, OutputRecord, sentinel};

/// Outcome of one lookup, as seen by the run loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Itinerary loaded and at least one passenger was read
    Extracted { passengers: usize },
    /// Itinerary loaded but no passenger block could be read
    NoPassengers,
    /// The itinerary never showed up
    LoadFailed,
    /// The lookup broke part way
    Errored(String),
}

impl LookupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Extracted { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            LookupOutcome::Extracted { .. } | LookupOutcome::NoPassengers
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessBand {
    High,
    Moderate,
    Low,
}

impl SuccessBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            SuccessBand::High
        } else if rate >= 50.0 {
            SuccessBand::Moderate
        } else {
            SuccessBand::Low
        }
    }
}

/// Figures reported at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub requests: usize,
    pub records: usize,
    /// Lookups that yielded at least one passenger
    pub successful: usize,
    /// Distinct references whose itinerary loaded
    pub loaded_references: usize,
    pub statuses_found: usize,
    pub seats_found: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// `outcomes` holds one entry per request, in request order.
    pub fn new(
        requests: &[LookupRequest],
        outcomes: &[LookupOutcome],
        records: &[OutputRecord],
        elapsed: Duration,
    ) -> Self {
        let unusable_status = [sentinel::NOT_FOUND, sentinel::ERROR, sentinel::FAILED];
        let unusable_seat = [sentinel::NOT_FOUND, sentinel::NOT_ASSIGNED, sentinel::ERROR];

        let loaded_references: HashSet<&str> = requests
            .iter()
            .zip(outcomes)
            .filter(|(_, outcome)| outcome.is_loaded())
            .map(|(request, _)| request.reference.as_str())
            .collect();

        Self {
            requests: requests.len(),
            records: records.len(),
            successful: outcomes.iter().filter(|o| o.is_success()).count(),
            loaded_references: loaded_references.len(),
            statuses_found: records
                .iter()
                .filter(|r| !unusable_status.contains(&r.flight_status.as_str()))
                .count(),
            seats_found: records
                .iter()
                .filter(|r| !unusable_seat.contains(&r.seat_number.as_str()))
                .count(),
            elapsed,
        }
    }

    /// Share of requests whose itinerary loaded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.loaded_references as f64 / self.requests as f64 * 100.0
        }
    }

    pub fn band(&self) -> SuccessBand {
        SuccessBand::from_rate(self.success_rate())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scraping completed: {}/{} successful",
            self.successful, self.requests
        )?;
        writeln!(f, "Total records: {}", self.records)?;
        writeln!(f, "Itineraries loaded: {}", self.loaded_references)?;
        writeln!(f, "Flight statuses found: {}", self.statuses_found)?;
        writeln!(f, "Seat numbers found: {}", self.seats_found)?;
        let label = match self.band() {
            SuccessBand::High => "High",
            SuccessBand::Moderate => "Moderate",
            SuccessBand::Low => "Low",
        };
        writeln!(f, "{} success rate: {:.1}%", label, self.success_rate())?;
        write!(f, "Total time: {:.1} seconds", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble_loaded, error_record, failure_record};
    use crate::results::{FlightRecord, PassengerRecord};

    #[test]
    fn test_summary_counts() {
        let ok = LookupRequest::new("AAA111", "Rao", "");
        let empty = LookupRequest::new("BBB222", "Iyer", "");
        let failed = LookupRequest::new("CCC333", "Das", "");
        let broken = LookupRequest::new("DDD444", "Sen", "");

        let passengers = vec![
            PassengerRecord {
                name: "A Rao".to_string(),
                gender: "Male".to_string(),
                age_category: "Adult".to_string(),
                seat_number: "16A".to_string(),
                flight_status: "Confirmed".to_string(),
            },
            PassengerRecord {
                name: "B Rao".to_string(),
                gender: "Female".to_string(),
                age_category: "Adult".to_string(),
                seat_number: "Not assigned".to_string(),
                flight_status: "No Show".to_string(),
            },
        ];

        let mut records = assemble_loaded(&FlightRecord::new(&ok), &passengers);
        records.extend(assemble_loaded(&FlightRecord::new(&empty), &[]));
        records.push(failure_record(&failed));
        records.push(error_record(&broken, "timeout"));

        let outcomes = vec![
            LookupOutcome::Extracted { passengers: 2 },
            LookupOutcome::NoPassengers,
            LookupOutcome::LoadFailed,
            LookupOutcome::Errored("timeout".to_string()),
        ];
        let requests = [ok, empty, failed, broken];
        let summary = RunSummary::new(&requests, &outcomes, &records, Duration::from_secs(3));

        assert_eq!(summary.records, 5);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.loaded_references, 2);
        // "Check manually" placeholder counts as a status, sentinels do not
        assert_eq!(summary.statuses_found, 3);
        assert_eq!(summary.seats_found, 1);
        assert_eq!(summary.success_rate(), 50.0);
        assert_eq!(summary.band(), SuccessBand::Moderate);
    }

    #[test]
    fn test_loaded_references_come_from_outcomes() {
        // The same booking listed twice counts once
        let requests = [
            LookupRequest::new("AAA111", "Rao", ""),
            LookupRequest::new("AAA111", "Rao", ""),
            LookupRequest::new("BBB222", "Iyer", ""),
        ];
        let outcomes = [
            LookupOutcome::Extracted { passengers: 1 },
            LookupOutcome::NoPassengers,
            LookupOutcome::Errored("timeout".to_string()),
        ];
        // A loaded flight whose origin text starts with "Error" is still loaded
        let mut flight = FlightRecord::new(&requests[2]);
        flight.source = "Error Bay".to_string();
        let records = assemble_loaded(&flight, &[]);

        let summary = RunSummary::new(&requests, &outcomes, &records, Duration::ZERO);
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.loaded_references, 1);
        assert_eq!(summary.successful, 1);
    }

    #[test]
    fn test_bands() {
        assert_eq!(SuccessBand::from_rate(80.0), SuccessBand::High);
        assert_eq!(SuccessBand::from_rate(79.9), SuccessBand::Moderate);
        assert_eq!(SuccessBand::from_rate(10.0), SuccessBand::Low);
    }

    #[test]
    fn test_empty_run_has_zero_rate() {
        let summary = RunSummary::new(&[], &[], &[], Duration::ZERO);
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(summary.band(), SuccessBand::Low);
    }
}
