pub mod exif;
pub mod guess;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::media;

/// Which strategy produced a capture date, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DateSource {
    Metadata,
    Filename,
    Modified,
    Now,
}

/// Result of date resolution: date + where it came from
#[derive(Debug, Clone, Copy)]
pub struct DateResult {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

/// Resolve a capture date using all methods in priority order. Never fails.
pub fn extract_date(path: &Path) -> DateResult {
    // 1. Embedded EXIF, photos only
    if media::is_eligible_for_metadata_date(media::extension_of(path)) {
        if let Some(date) = exif::read_exif_date(path) {
            return DateResult { date, source: DateSource::Metadata };
        }
    }

    // 2. Filename conventions
    if let Some(date) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(guess::guess_date_from_filename)
    {
        return DateResult { date, source: DateSource::Filename };
    }

    // 3. Filesystem mtime
    if let Some(date) = modified_time(path) {
        return DateResult { date, source: DateSource::Modified };
    }

    DateResult {
        date: Local::now().naive_local(),
        source: DateSource::Now,
    }
}

pub fn resolve_capture_date(path: &Path) -> NaiveDateTime {
    let result = extract_date(path);
    log::debug!(
        "{}: {} from {:?}",
        path.display(),
        result.date,
        result.source
    );
    result.date
}

/// Modification time of a file in local time.
pub fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}
