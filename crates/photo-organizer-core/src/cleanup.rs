use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::scan;

/// Count entries in `dir` that are not hidden. Unreadable directories count as
/// non-empty so they are left alone.
fn visible_entries(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return usize::MAX;
    };
    entries
        .flatten()
        .filter(|e| !scan::is_hidden_name(&e.file_name().to_string_lossy()))
        .count()
}

/// Remove every directory below `root` (not `root` itself) that holds no
/// visible entries, hidden leftovers included. Children are handled before
/// their parents, so a folder of empty folders goes too. Hidden and camera
/// housekeeping directories are candidates like any other; they are only
/// skipped when discovering files.
/// Returns how many directories were removed.
pub fn prune_empty_directories(root: &Path) -> usize {
    let mut removed = 0;

    let dirs: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();

    // Reversed pre-order visits every child before its parent
    for path in dirs.iter().rev() {
        if visible_entries(path) != 0 {
            continue;
        }
        match fs::remove_dir_all(path) {
            Ok(()) => {
                log::debug!("Removed empty folder {}", path.display());
                removed += 1;
            }
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }

    removed
}
