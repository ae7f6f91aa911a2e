use scraper::Html;

use crate::layout;
use crate::parsers::html::{is_visible, visible_text_nodes};
use crate::parsers::selector;
use crate::portal::PageSnapshot;

/// What made a page count as loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessSignal {
    /// A known itinerary region is present and visible
    Selector(&'static str),
    /// The URL moved to an itinerary path
    Url,
}

/// Outcome of inspecting a page after the lookup was submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded(SuccessSignal),
    /// The page shows a rejection message
    ErrorShown(String),
    /// Neither signal seen (yet)
    NotLoaded,
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded(_))
    }

    /// Whether polling again could still change the answer
    pub fn is_final(&self) -> bool {
        !matches!(self, LoadStatus::NotLoaded)
    }
}

/// Decide whether the itinerary loaded.
///
/// Checked in order: visible error text (fails even if itinerary regions are
/// also present), itinerary regions, then the URL.
pub fn check_booking_loaded(snapshot: &PageSnapshot) -> LoadStatus {
    let doc = Html::parse_document(&snapshot.html);

    if let Some(text) = find_error_text(&doc) {
        ::log::warn!("Error message found: {}", text);
        return LoadStatus::ErrorShown(text);
    }

    for &indicator in layout::SUCCESS_INDICATORS {
        let Ok(sel) = selector(indicator) else {
            continue;
        };
        if doc.select(&sel).any(is_visible) {
            ::log::info!("Found success indicator: {}", indicator);
            return LoadStatus::Loaded(SuccessSignal::Selector(indicator));
        }
    }

    let url = snapshot.url.to_lowercase();
    if layout::ITINERARY_URL_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
    {
        ::log::info!("Itinerary URL detected: {}", snapshot.url);
        return LoadStatus::Loaded(SuccessSignal::Url);
    }

    LoadStatus::NotLoaded
}

fn find_error_text(doc: &Html) -> Option<String> {
    visible_text_nodes(doc.root_element())
        .into_iter()
        .find(|text| {
            layout::ERROR_TEXT_PATTERNS
                .iter()
                .any(|pattern| text.contains(pattern))
        })
}
