use std::path::PathBuf;

use chrono::{DateTime, Local};

/// First `max` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Default export file name, e.g. `booking_details_20250101_093000.csv`
pub fn timestamped_output_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "booking_details_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    ))
}
