use scraper::Html;

use crate::error::HarvestError;
use crate::layout;
use crate::parsers::html::element_text;
use crate::parsers::{SelectorChain, fill_field, selector};
use crate::results::{FlightRecord, LookupRequest};

/// Extract flight-level details from a loaded itinerary.
///
/// Every field is looked up on its own; whatever is missing stays "Not found".
pub fn extract_flight_details(doc: &Html, request: &LookupRequest) -> FlightRecord {
    let mut flight = FlightRecord::new(request);
    let root = doc.root_element();

    match extract_route(doc) {
        Ok(Some((source, destination))) => {
            ::log::info!("Found route: {} to {}", source, destination);
            flight.source = source;
            flight.destination = destination;
        }
        Ok(None) => ::log::warn!("Could not extract route"),
        Err(e) => ::log::warn!("Could not extract route: {}", e),
    }

    let text = |candidates: &[&'static str]| SelectorChain::new(candidates).map(|c| c.text(root));

    fill_field(&mut flight.date, "date", || text(layout::DEPARTURE_DATE));
    fill_field(&mut flight.flight_number, "flight number", || {
        text(layout::FLIGHT_NUMBER)
    });
    fill_field(&mut flight.departure_time, "departure time", || {
        text(layout::DEPARTURE_TIME)
    });
    fill_field(&mut flight.arrival_time, "arrival time", || {
        text(layout::ARRIVAL_TIME)
    });
    fill_field(&mut flight.stop_type, "stop type", || text(layout::STOP_TYPE));
    fill_field(&mut flight.cabin_baggage, "cabin baggage", || {
        Ok(text(layout::CABIN_BAGGAGE)?.map(|v| format!("{} Cabin", v)))
    });
    fill_field(&mut flight.checkin_baggage, "check-in baggage", || {
        Ok(text(layout::CHECKIN_BAGGAGE)?.map(|v| format!("{} Check-in", v)))
    });

    flight
}

/// Origin and destination from the first two stops of the route container
fn extract_route(doc: &Html) -> Result<Option<(String, String)>, HarvestError> {
    let container_sel = selector(layout::ROUTE_CONTAINER)?;
    let stop_sel = selector(layout::ROUTE_STOP)?;

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(None);
    };

    let stops: Vec<String> = container.select(&stop_sel).map(element_text).collect();
    match stops.as_slice() {
        [source, destination, ..] => Ok(Some((source.clone(), destination.clone()))),
        _ => Ok(None),
    }
}
