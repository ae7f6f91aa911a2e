
/// Literal values written in place of data the page did not provide
pub mod sentinel {
    pub const NOT_FOUND: &str = "Not found";
    pub const NOT_ASSIGNED: &str = "Not assigned";
    pub const FAILED_TO_LOAD: &str = "Failed to load";
    pub const FAILED: &str = "Failed";
    pub const ERROR: &str = "Error";
    pub const UNKNOWN: &str = "Unknown";
    pub const ADULT: &str = "Adult";
    pub const CONFIRMED: &str = "Confirmed";
    pub const CHECK_MANUALLY: &str = "Check manually";
    pub const NO_PASSENGERS: &str = "No passenger details found";
}

/// Export columns, in the order they are written
pub const COLUMNS: [&str; 18] = [
    "secondary_code",
    "reference",
    "surname",
    "name",
    "flight_status",
    "seat_number",
    "source",
    "destination",
    "date",
    "flight_number",
    "departure_time",
    "arrival_time",
    "stop_type",
    "cabin_baggage",
    "checkin_baggage",
    "passenger_count",
    "gender",
    "age_category",
];

/// One booking to look up, taken from one input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// Booking reference (PNR)
    pub reference: String,

    /// Passenger surname (or e-mail) paired with the reference
    pub surname: String,

    /// Caller's own booking code, carried through to the export untouched
    pub secondary_code: String,
}

impl LookupRequest {
    /// Create a new lookup request
    pub fn new(reference: &str, surname: &str, secondary_code: &str) -> Self {
        Self {
            reference: reference.to_string(),
            surname: surname.to_string(),
            secondary_code: secondary_code.to_string(),
        }
    }
}

/// Flight-level data scraped from a loaded itinerary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRecord {
    pub secondary_code: String,
    pub reference: String,
    pub surname: String,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub stop_type: String,
    pub cabin_baggage: String,
    pub checkin_baggage: String,
}

impl FlightRecord {
    /// Provenance from the request, every scraped field filled with `fill`
    pub fn filled(request: &LookupRequest, fill: &str) -> Self {
        Self {
            secondary_code: request.secondary_code.clone(),
            reference: request.reference.clone(),
            surname: request.surname.clone(),
            source: fill.to_string(),
            destination: fill.to_string(),
            date: fill.to_string(),
            flight_number: fill.to_string(),
            departure_time: fill.to_string(),
            arrival_time: fill.to_string(),
            stop_type: fill.to_string(),
            cabin_baggage: fill.to_string(),
            checkin_baggage: fill.to_string(),
        }
    }

    /// A record with nothing scraped yet
    pub fn new(request: &LookupRequest) -> Self {
        Self::filled(request, sentinel::NOT_FOUND)
    }
}

/// One passenger block from a loaded itinerary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassengerRecord {
    pub name: String,
    pub gender: String,
    pub age_category: String,
    pub seat_number: String,
    pub flight_status: String,
}

impl PassengerRecord {
    /// Stand-in used when a loaded itinerary lists no passengers
    pub fn placeholder() -> Self {
        Self {
            name: sentinel::NO_PASSENGERS.to_string(),
            gender: sentinel::UNKNOWN.to_string(),
            age_category: sentinel::UNKNOWN.to_string(),
            seat_number: sentinel::NOT_FOUND.to_string(),
            flight_status: sentinel::CHECK_MANUALLY.to_string(),
        }
    }
}

/// A single exported row. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub secondary_code: String,
    pub reference: String,
    pub surname: String,
    pub name: String,
    pub flight_status: String,
    pub seat_number: String,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub stop_type: String,
    pub cabin_baggage: String,
    pub checkin_baggage: String,
    pub passenger_count: usize,
    pub gender: String,
    pub age_category: String,
}

impl OutputRecord {
    /// Merge flight data with one passenger
    pub fn merge(flight: &FlightRecord, passenger: &PassengerRecord, passenger_count: usize) -> Self {
        Self {
            secondary_code: flight.secondary_code.clone(),
            reference: flight.reference.clone(),
            surname: flight.surname.clone(),
            name: passenger.name.clone(),
            flight_status: passenger.flight_status.clone(),
            seat_number: passenger.seat_number.clone(),
            source: flight.source.clone(),
            destination: flight.destination.clone(),
            date: flight.date.clone(),
            flight_number: flight.flight_number.clone(),
            departure_time: flight.departure_time.clone(),
            arrival_time: flight.arrival_time.clone(),
            stop_type: flight.stop_type.clone(),
            cabin_baggage: flight.cabin_baggage.clone(),
            checkin_baggage: flight.checkin_baggage.clone(),
            passenger_count,
            gender: passenger.gender.clone(),
            age_category: passenger.age_category.clone(),
        }
    }

    /// Row cells in [`COLUMNS`] order. Empty scraped cells become "Not found";
    /// the secondary code is provenance and is written as given.
    pub fn to_row(&self) -> Vec<String> {
        let cells = [
            &self.reference,
            &self.surname,
            &self.name,
            &self.flight_status,
            &self.seat_number,
            &self.source,
            &self.destination,
            &self.date,
            &self.flight_number,
            &self.departure_time,
            &self.arrival_time,
            &self.stop_type,
            &self.cabin_baggage,
            &self.checkin_baggage,
        ];

        let mut row = Vec::with_capacity(COLUMNS.len());
        row.push(self.secondary_code.clone());
        row.extend(cells.iter().map(|cell| or_not_found(cell)));
        row.push(self.passenger_count.to_string());
        row.push(or_not_found(&self.gender));
        row.push(or_not_found(&self.age_category));
        row
    }
}

fn or_not_found(value: &str) -> String {
    if value.trim().is_empty() {
        sentinel::NOT_FOUND.to_string()
    } else {
        value.to_string()
    }
}
