use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What kind of media a file is, judged purely by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    Photo,
    Video,
    Audio,
    /// Metadata files that travel with a capture (DJI .lrf, .xmp, .json)
    Sidecar,
    Unsupported,
}

/// Classify an extension, with or without the leading dot. Case-insensitive.
pub fn classify(extension: &str) -> MediaCategory {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        // hif: Apple HEIF, dng/arw/cr2/nef/raf: camera RAW
        "jpg" | "jpeg" | "png" | "gif" | "heic" | "hif" | "dng" | "arw" | "cr2" | "nef"
        | "raf" => MediaCategory::Photo,
        "mp4" | "mov" | "avi" | "mkv" => MediaCategory::Video,
        // DJI drones record audio next to the clip
        "wav" | "mp3" => MediaCategory::Audio,
        "lrf" | "xmp" | "json" => MediaCategory::Sidecar,
        _ => MediaCategory::Unsupported,
    }
}

pub fn is_eligible_for_organizing(extension: &str) -> bool {
    classify(extension) != MediaCategory::Unsupported
}

/// Only photos carry embedded capture metadata worth reading.
pub fn is_eligible_for_metadata_date(extension: &str) -> bool {
    classify(extension) == MediaCategory::Photo
}

/// Extension of a path as a string, empty if there is none.
pub fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// A file found in the drop folder, waiting to be planned.
#[derive(Debug, Clone)]
pub struct CapturedFile {
    /// Absolute path inside Incoming/
    pub path: PathBuf,
    /// Extension as found on disk, without the dot
    pub extension: String,
    pub category: MediaCategory,
}

impl CapturedFile {
    pub fn new(path: PathBuf) -> Self {
        let extension = extension_of(&path).to_string();
        let category = classify(&extension);
        Self {
            path,
            extension,
            category,
        }
    }

    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("jpg"), MediaCategory::Photo);
        assert_eq!(classify(".JPG"), MediaCategory::Photo);
        assert_eq!(classify("ARW"), MediaCategory::Photo);
        assert_eq!(classify("MP4"), MediaCategory::Video);
        assert_eq!(classify(".wav"), MediaCategory::Audio);
        assert_eq!(classify("LRF"), MediaCategory::Sidecar);
        assert_eq!(classify("txt"), MediaCategory::Unsupported);
        assert_eq!(classify(""), MediaCategory::Unsupported);
    }

    #[test]
    fn test_eligibility() {
        assert!(is_eligible_for_organizing("xmp"));
        assert!(is_eligible_for_organizing("MOV"));
        assert!(!is_eligible_for_organizing("pdf"));

        assert!(is_eligible_for_metadata_date("heic"));
        assert!(!is_eligible_for_metadata_date("mp4"));
        assert!(!is_eligible_for_metadata_date("json"));
    }

    #[test]
    fn test_captured_file() {
        let f = CapturedFile::new(PathBuf::from("/lib/Incoming/trip/DJI_0001.MP4"));
        assert_eq!(f.extension, "MP4");
        assert_eq!(f.category, MediaCategory::Video);
        assert_eq!(f.filename(), "DJI_0001.MP4");
    }
}
