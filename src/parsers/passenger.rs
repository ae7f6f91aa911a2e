use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::HarvestError;
use crate::layout;
use crate::parsers::html::element_text;
use crate::parsers::{SelectorChain, selector};
use crate::results::{PassengerRecord, sentinel};

/// Extract every passenger block from a loaded itinerary.
///
/// Blocks without a name are skipped. Other fields fall back to defaults
/// because the markup differs between fare types and booking states.
pub fn extract_passenger_details(doc: &Html) -> Vec<PassengerRecord> {
    match PassengerExtractor::new() {
        Ok(extractor) => extractor.extract_all(doc),
        Err(e) => {
            ::log::error!("Error extracting passenger details: {}", e);
            Vec::new()
        }
    }
}

/// Seat number (e.g. `16A`) inside free text
pub fn find_seat_number(seat_pattern: &Regex, text: &str) -> Option<String> {
    seat_pattern.find(text).map(|m| m.as_str().to_string())
}

struct PassengerExtractor {
    block: scraper::Selector,
    name: SelectorChain,
    info: scraper::Selector,
    seat: SelectorChain,
    status: SelectorChain,
    seat_pattern: Regex,
}

impl PassengerExtractor {
    fn new() -> Result<Self, HarvestError> {
        Ok(Self {
            block: selector(layout::PASSENGER_BLOCK)?,
            name: SelectorChain::new(layout::PASSENGER_NAME)?,
            info: selector(layout::PASSENGER_INFO)?,
            seat: SelectorChain::new(layout::PASSENGER_SEAT)?,
            status: SelectorChain::new(layout::PASSENGER_STATUS)?,
            seat_pattern: Regex::new(layout::SEAT_PATTERN)
                .map_err(|e| HarvestError::Extraction(e.to_string()))?,
        })
    }

    fn extract_all(&self, doc: &Html) -> Vec<PassengerRecord> {
        let blocks: Vec<ElementRef<'_>> = doc.select(&self.block).collect();
        ::log::info!("Found {} passenger sections", blocks.len());

        let passengers: Vec<PassengerRecord> = blocks
            .into_iter()
            .enumerate()
            .filter_map(|(i, block)| {
                let passenger = self.extract_one(block);
                match &passenger {
                    Some(p) => ::log::info!("Extracted passenger {}: {}", i + 1, p.name),
                    None => ::log::warn!("Skipping passenger section {} - no name found", i),
                }
                passenger
            })
            .collect();

        ::log::info!("Successfully extracted {} passengers", passengers.len());
        passengers
    }

    fn extract_one(&self, block: ElementRef<'_>) -> Option<PassengerRecord> {
        let name = self.name.text(block)?;

        let info: Vec<String> = block.select(&self.info).map(element_text).collect();
        let (gender, age_category) = match info.as_slice() {
            [gender, age, ..] => (gender.clone(), age.clone()),
            _ => {
                ::log::warn!("Could not extract gender/age category, using defaults");
                (sentinel::UNKNOWN.to_string(), sentinel::ADULT.to_string())
            }
        };

        let seat_number = self
            .seat
            .text(block)
            .and_then(|text| find_seat_number(&self.seat_pattern, &text))
            .unwrap_or_else(|| {
                ::log::warn!("No seat number found for {}", name);
                sentinel::NOT_ASSIGNED.to_string()
            });

        let flight_status = self.status.text(block).unwrap_or_else(|| {
            ::log::warn!("Could not extract flight status, defaulting to 'Confirmed'");
            sentinel::CONFIRMED.to_string()
        });

        Some(PassengerRecord {
            name,
            gender,
            age_category,
            seat_number,
            flight_status,
        })
    }
}
