use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::media::{self, CapturedFile};

/// System and camera housekeeping folders that never hold user media.
const SKIP_FOLDERS: &[&str] = &[
    ".stfolder",       // Syncthing
    ".fseventsd",      // macOS filesystem events
    ".Trashes",        // macOS trash
    ".Spotlight-V100", // macOS Spotlight index
    "PRIVATE",         // camera system folder
    "AVF_INFO",        // Sony AVCHD info
    "THMBNL",          // Sony thumbnails
];

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// True for entries the walk must neither report nor descend into.
pub(crate) fn is_excluded(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    is_hidden_name(&name)
        || (entry.file_type().is_dir() && SKIP_FOLDERS.iter().any(|skip| *skip == name))
}

/// Walk the drop folder and collect every file eligible for organizing,
/// in lexical path order. Unreadable entries are skipped.
pub fn find_files_to_organize(incoming: &Path) -> Vec<CapturedFile> {
    WalkDir::new(incoming)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| media::is_eligible_for_organizing(media::extension_of(e.path())))
        .map(|e| CapturedFile::new(e.into_path()))
        .collect()
}
