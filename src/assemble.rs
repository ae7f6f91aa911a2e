use crate::results::{FlightRecord, LookupRequest, OutputRecord, PassengerRecord, sentinel};
use crate::utils::truncate_chars;

/// Characters of an error message kept in the `source` column
const ERROR_MESSAGE_CHARS: usize = 50;

/// Records for an itinerary that loaded: one per passenger, or a single
/// placeholder row when no passenger could be read.
pub fn assemble_loaded(flight: &FlightRecord, passengers: &[PassengerRecord]) -> Vec<OutputRecord> {
    if passengers.is_empty() {
        ::log::warn!(
            "No passenger details found for {}, saved flight details only",
            flight.reference
        );
        return vec![OutputRecord::merge(
            flight,
            &PassengerRecord::placeholder(),
            0,
        )];
    }

    passengers
        .iter()
        .map(|passenger| {
            ::log::debug!("Combined data for passenger: {}", passenger.name);
            OutputRecord::merge(flight, passenger, passengers.len())
        })
        .collect()
}

/// Record for a lookup whose itinerary never showed up
pub fn failure_record(request: &LookupRequest) -> OutputRecord {
    let flight = FlightRecord::filled(request, sentinel::FAILED_TO_LOAD);
    let passenger = PassengerRecord {
        name: sentinel::FAILED_TO_LOAD.to_string(),
        gender: sentinel::UNKNOWN.to_string(),
        age_category: sentinel::UNKNOWN.to_string(),
        seat_number: sentinel::NOT_FOUND.to_string(),
        flight_status: sentinel::FAILED.to_string(),
    };
    OutputRecord::merge(&flight, &passenger, 0)
}

/// Record for a lookup that broke part way; the message goes in `source`
pub fn error_record(request: &LookupRequest, message: &str) -> OutputRecord {
    let mut flight = FlightRecord::filled(request, sentinel::ERROR);
    flight.source = format!(
        "{}: {}",
        sentinel::ERROR,
        truncate_chars(message, ERROR_MESSAGE_CHARS)
    );
    let passenger = PassengerRecord {
        name: sentinel::ERROR.to_string(),
        gender: sentinel::UNKNOWN.to_string(),
        age_category: sentinel::UNKNOWN.to_string(),
        seat_number: sentinel::ERROR.to_string(),
        flight_status: sentinel::ERROR.to_string(),
    };
    OutputRecord::merge(&flight, &passenger, 0)
}
