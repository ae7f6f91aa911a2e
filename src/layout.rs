//! Markup of the booking lookup page.
//!
//! Everything here is an uncontrolled external contract: the page can change
//! class names, placeholders or button text without notice. Chains are tried
//! in order and the first match wins.

use fantoccini::Locator;

/// Page the lookup form lives on
pub const LOOKUP_URL: &str = "https://www.goindigo.in/edit-booking.html";

/// A WebDriver element candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Css(&'static str),
    XPath(&'static str),
}

impl Candidate {
    pub fn locator(&self) -> Locator<'static> {
        match *self {
            Candidate::Css(selector) => Locator::Css(selector),
            Candidate::XPath(path) => Locator::XPath(path),
        }
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Candidate::Css(selector) => write!(f, "css `{}`", selector),
            Candidate::XPath(path) => write!(f, "xpath `{}`", path),
        }
    }
}

pub const REFERENCE_INPUTS: &[Candidate] = &[
    Candidate::Css("input[placeholder*='PNR']"),
    Candidate::Css("input[placeholder*='Booking Reference']"),
    Candidate::Css("input[placeholder*='Booking reference']"),
    Candidate::Css("input[name*='pnr']"),
    Candidate::Css("input[id*='pnr']"),
    Candidate::Css("input[type='text']:first-of-type"),
];

pub const SURNAME_INPUTS: &[Candidate] = &[
    Candidate::Css("input[placeholder*='Last Name']"),
    Candidate::Css("input[placeholder*='Last name']"),
    Candidate::Css("input[placeholder*='Email']"),
    Candidate::Css("input[placeholder*='Email ID']"),
    Candidate::Css("input[name*='lastname']"),
    Candidate::Css("input[name*='email']"),
    Candidate::Css("input[type='text']:last-of-type"),
];

pub const SUBMIT_BUTTONS: &[Candidate] = &[
    Candidate::XPath("//button[contains(text(), 'Get Itinerary')]"),
    Candidate::XPath("//input[@value='Get Itinerary']"),
    Candidate::Css("button[type='submit']"),
    Candidate::Css(".btn-primary"),
    Candidate::Css("button:last-of-type"),
];

/// Visible text containing any of these means the lookup was rejected.
/// Matching is case-sensitive.
pub const ERROR_TEXT_PATTERNS: &[&str] = &["Invalid", "not found", "incorrect", "error"];

/// Any of these present means the itinerary rendered
pub const SUCCESS_INDICATORS: &[&str] = &[
    ".view-itinerary",
    ".itinerary-details-title",
    ".booking-info",
    ".flight-details",
    ".passenger-details",
];

/// Lowercase URL fragments that only appear once an itinerary is shown
pub const ITINERARY_URL_MARKERS: &[&str] = &["itinerary", "booking-details"];

// Flight-level fields
pub const ROUTE_CONTAINER: &str = ".flight-journey-tab-container__leg";
pub const ROUTE_STOP: &str = "span";
pub const DEPARTURE_DATE: &[&str] = &[".booking-info-container-other-info__date span"];
pub const FLIGHT_NUMBER: &[&str] = &[".flight-code"];
pub const DEPARTURE_TIME: &[&str] = &[".departure-time"];
pub const ARRIVAL_TIME: &[&str] = &[".arrival-time"];
pub const STOP_TYPE: &[&str] = &[".flight-stops"];
pub const CABIN_BAGGAGE: &[&str] = &[".cabin .cabin-value"];
pub const CHECKIN_BAGGAGE: &[&str] = &[".checkin .checkin-value"];

// Passenger blocks, selectors relative to each block
pub const PASSENGER_BLOCK: &str = ".passenger-details";
pub const PASSENGER_NAME: &[&str] = &[".passenger-details__top-section__full-name span"];
pub const PASSENGER_INFO: &str = ".passenger-details__top-section__p-info__age-group";
pub const PASSENGER_SEAT: &[&str] = &[".passenger-details__bottom-section__seat-info"];
pub const PASSENGER_STATUS: &[&str] = &[
    ".sector-chip-no-show",
    ".flight-status",
    ".booking-status",
    ".status-chip",
    "[class*='status']",
    "[class*='chip']",
];

/// Row number of one or two digits followed by a seat letter, e.g. `16A`
pub const SEAT_PATTERN: &str = r"\b\d{1,2}[A-Z]\b";
