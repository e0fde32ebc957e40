use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

struct DatePattern {
    regex: &'static LazyLock<Regex>,
    format: &'static str,
}

// DJI drone: DJI_20250619224111_0001_D.MP4
static RE_DJI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"DJI_(?P<date>\d{8})").unwrap());
// Sony clip: 20250616_C0416.MP4
static RE_SONY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?P<date>\d{8})_C\d+").unwrap());
// IMG_20250619_123456.jpg
static RE_STAMP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?P<date>\d{8})_\d{6}").unwrap());
// 2025-06-19_photo.jpg
static RE_ISO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?P<date>\d{4}-\d{2}-\d{2})").unwrap());
// 20250619_photo.jpg
static RE_COMPACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?P<date>\d{8})").unwrap());

/// Tried top to bottom, first match that parses wins.
/// Device conventions must stay above the bare 8-digit catch-all.
static PATTERNS: &[DatePattern] = &[
    DatePattern { regex: &RE_DJI, format: "%Y%m%d" },
    DatePattern { regex: &RE_SONY, format: "%Y%m%d" },
    DatePattern { regex: &RE_STAMP, format: "%Y%m%d" },
    DatePattern { regex: &RE_ISO, format: "%Y-%m-%d" },
    DatePattern { regex: &RE_COMPACT, format: "%Y%m%d" },
];

pub fn guess_date_from_filename(filename: &str) -> Option<NaiveDateTime> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    for pat in PATTERNS {
        // Only the leftmost occurrence of each rule is considered
        if let Some(caps) = pat.regex.captures(basename) {
            if let Some(date_str) = caps.name("date") {
                if let Ok(d) = NaiveDate::parse_from_str(date_str.as_str(), pat.format) {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
        }
    }

    None
}
