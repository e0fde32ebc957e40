use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const INCOMING_DIR: &str = "Incoming";
pub const ORIGINALS_DIR: &str = "Originals";
pub const EXPORTS_DIR: &str = "Exports";
pub const MANIFEST_DIR: &str = "_Manifest";
pub const MANIFEST_FILENAME: &str = "photo_manifest.csv";

/// Every path the organizer touches, derived once from the library root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLayout {
    pub root: PathBuf,
    /// Drop folder scanned for new files
    pub incoming: PathBuf,
    /// Archive tree, `<originals>/<YYYY>/<YYYY-MM-DD>/<file>`
    pub originals: PathBuf,
    /// Curated/edited output, only created by `init`
    pub exports: PathBuf,
    pub manifest_dir: PathBuf,
    pub manifest_file: PathBuf,
}

impl LibraryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let manifest_dir = root.join(MANIFEST_DIR);
        Self {
            incoming: root.join(INCOMING_DIR),
            originals: root.join(ORIGINALS_DIR),
            exports: root.join(EXPORTS_DIR),
            manifest_file: manifest_dir.join(MANIFEST_FILENAME),
            manifest_dir,
            root,
        }
    }

    /// Ledger key for an archived file: its path relative to the library root.
    pub fn relative_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// First path component below Incoming/ (the folder a file was dropped in).
    pub fn source_folder(&self, source: &Path) -> String {
        source
            .strip_prefix(&self.incoming)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Create the library directory structure.
    /// Returns each directory with whether it was newly created.
    pub fn init(&self) -> anyhow::Result<Vec<(PathBuf, bool)>> {
        let mut report = Vec::with_capacity(4);
        for dir in [&self.incoming, &self.originals, &self.exports, &self.manifest_dir] {
            if dir.is_dir() {
                report.push((dir.clone(), false));
                continue;
            }
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            log::info!("Created {}", dir.display());
            report.push((dir.clone(), true));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = LibraryLayout::new("/photos");
        assert_eq!(layout.incoming, Path::new("/photos/Incoming"));
        assert_eq!(layout.originals, Path::new("/photos/Originals"));
        assert_eq!(
            layout.manifest_file,
            Path::new("/photos/_Manifest/photo_manifest.csv")
        );
    }

    #[test]
    fn test_relative_key_and_source_folder() {
        let layout = LibraryLayout::new("/photos");
        let dest = layout.originals.join("2025").join("2025-06-19").join("a.jpg");
        let expected = Path::new("Originals")
            .join("2025")
            .join("2025-06-19")
            .join("a.jpg");
        assert_eq!(layout.relative_key(&dest), expected.to_string_lossy());

        assert_eq!(layout.source_folder(&layout.incoming.join("trip").join("a.jpg")), "trip");
        // Files dropped straight into Incoming/ report their own name
        assert_eq!(layout.source_folder(&layout.incoming.join("a.jpg")), "a.jpg");
        assert_eq!(layout.source_folder(Path::new("/elsewhere/a.jpg")), "");
    }

    #[test]
    fn test_init_is_repeatable() {
        let dir = tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path());

        let first = layout.init().unwrap();
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|(_, created)| *created));
        assert!(layout.incoming.is_dir());
        assert!(layout.exports.is_dir());

        let second = layout.init().unwrap();
        assert!(second.iter().all(|(_, created)| !*created));
    }
}
