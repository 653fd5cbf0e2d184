//! Time parsing and formatting utilities

use std::sync::OnceLock;

use regex::Regex;

/// Format seconds as `HH:MM:SS`.
///
/// The value is floored first; the hours field grows past two digits rather
/// than wrapping at 24.
pub fn to_display(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse `H:M:S` / `HH:MM:SS` text into whole seconds.
///
/// Returns `None` when the text does not have exactly three numeric fields.
/// Callers treat `None` as "reject the edit and keep the previous value".
pub fn from_display(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let mut fields = [0u64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }

    let [hours, minutes, secs] = fields;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(secs)
}

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:v=|youtu\.be/)([A-Za-z0-9_-]{11})").expect("static pattern is valid")
    })
}

/// Extract the 11-character YouTube video id from a watch or short link.
pub fn video_id_from_url(url: &str) -> Option<String> {
    video_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
