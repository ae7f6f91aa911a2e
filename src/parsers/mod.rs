pub mod detect;
pub mod flight;
pub mod html;
pub mod passenger;


use crate::error::HarvestError;
use scraper::{ElementRef, Selector};

pub use detect::{LoadStatus, SuccessSignal, check_booking_loaded};
pub use flight::extract_flight_details;
pub use passenger::extract_passenger_details;

/// An ordered list of CSS selectors tried one after another.
///
/// The first selector that yields an element with non-blank text wins.
#[derive(Debug)]
pub struct SelectorChain {
    selectors: Vec<(&'static str, Selector)>,
}

impl SelectorChain {
    /// Compile every candidate up front
    pub fn new(candidates: &[&'static str]) -> Result<Self, HarvestError> {
        let selectors = candidates
            .iter()
            .map(|&css| {
                Selector::parse(css)
                    .map(|selector| (css, selector))
                    .map_err(|e| HarvestError::Extraction(format!("bad selector `{}`: {:?}", css, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// Text of the first non-blank match under `scope`
    pub fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|(css, selector)| {
            let found = scope
                .select(selector)
                .map(html::element_text)
                .find(|text| !text.is_empty());
            if found.is_some() {
                ::log::trace!("Selector `{}` matched", css);
            }
            found
        })
    }
}

/// Compile a single selector
pub(crate) fn selector(css: &'static str) -> Result<Selector, HarvestError> {
    Selector::parse(css)
        .map_err(|e| HarvestError::Extraction(format!("bad selector `{}`: {:?}", css, e)))
}

/// Run one field extraction, keeping `current` when it fails.
///
/// Each field is isolated: a broken selector is logged and only that field
/// keeps its sentinel.
pub(crate) fn fill_field<F>(current: &mut String, field: &str, extract: F)
where
    F: FnOnce() -> Result<Option<String>, HarvestError>,
{
    match extract() {
        Ok(Some(value)) => {
            ::log::debug!("Found {}: {}", field, value);
            *current = value;
        }
        Ok(None) => ::log::warn!("Could not extract {}", field),
        Err(e) => ::log::warn!("Could not extract {}: {}", field, e),
    }
}
