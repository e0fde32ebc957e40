pub mod cleanup;
pub mod date;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod manifest;
pub mod media;
pub mod mover;
pub mod planner;
pub mod scan;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::OrganizeError;
pub use layout::LibraryLayout;
pub use mover::{MoveOutcome, MovedFileRecord, Mover};
pub use planner::{OrganizePlan, PlanAction, Planner};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    /// Library root holding Incoming/, Originals/ and _Manifest/
    pub root: PathBuf,
    /// Actually move files; otherwise only report the plan
    #[serde(default)]
    pub execute: bool,
    /// Merge moved files into the ledger (execute mode only)
    #[serde(default)]
    pub update_manifest: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    pub discovered: u64,
    /// Files moved, or in preview the files that would be
    pub organized: u64,
    pub duplicates_skipped: u64,
    pub failed: u64,
    pub manifest_entries_added: u64,
    pub folders_removed: u64,
    pub plans: Vec<OrganizePlan>,
    pub moved: Vec<MovedFileRecord>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Type alias for progress callback: stage, current, total, message.
/// Callers may borrow local state.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Run one organize pass over the library.
///
/// Per-file problems are logged and counted, never fatal. The only error
/// returned is a missing drop folder, checked before anything is touched.
pub fn process(
    options: &OrganizeOptions,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ProcessResult> {
    let layout = LibraryLayout::new(&options.root);

    if !layout.incoming.is_dir() {
        return Err(OrganizeError::MissingIncoming(layout.incoming.clone()).into());
    }

    // Stage 1: Discover
    let files = scan::find_files_to_organize(&layout.incoming);
    let total = files.len() as u64;
    progress_callback("scan", total, total, &format!("Found {} files to organize", total));

    let mut result = ProcessResult {
        discovered: total,
        ..Default::default()
    };

    // Stage 2: Plan and move, one file at a time
    let mut planner = Planner::new(&layout.originals);
    let mover = Mover::new(&layout);

    for (i, file) in files.iter().enumerate() {
        let current = i as u64;
        let rel_src = display_path(&layout.root, &file.path);

        let plan = match planner.plan(file) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("Failed to plan {}: {:#}", file.path.display(), e);
                progress_callback("error", current, total, &format!("{}: {:#}", rel_src, e));
                result.failed += 1;
                continue;
            }
        };

        if plan.action == PlanAction::SkipDuplicate {
            progress_callback("duplicate", current, total, &rel_src);
            result.duplicates_skipped += 1;
            result.plans.push(plan);
            continue;
        }

        if !options.execute {
            planner.claim(&plan);
            let rel_dest = display_path(&layout.root, &plan.destination);
            progress_callback("preview", current, total, &format!("{} -> {}", rel_src, rel_dest));
            result.organized += 1;
            result.plans.push(plan);
            continue;
        }

        // A failed move leaves its destination free for later files
        match mover.execute(&plan) {
            Ok(MoveOutcome::Moved(record)) => {
                planner.claim_path(&record.destination, record.size);
                let rel_dest = display_path(&layout.root, &record.destination);
                progress_callback("move", current, total, &format!("{} -> {}", rel_src, rel_dest));
                result.organized += 1;
                result.moved.push(record);
            }
            Ok(MoveOutcome::Skipped) => {
                progress_callback("duplicate", current, total, &rel_src);
                result.duplicates_skipped += 1;
            }
            Err(e) => {
                log::error!("Failed to move {}: {:#}", file.path.display(), e);
                progress_callback("error", current, total, &format!("{}: {:#}", rel_src, e));
                result.failed += 1;
            }
        }
        result.plans.push(plan);
    }

    if !options.execute {
        return Ok(result);
    }

    // Stage 3: Ledger. A write failure leaves the moves in place.
    if options.update_manifest && !result.moved.is_empty() {
        match manifest::merge(&layout.manifest_file, &result.moved) {
            Ok(added) => {
                result.manifest_entries_added = added as u64;
                progress_callback("manifest", 1, 1, &format!("Added {} entries to manifest", added));
            }
            Err(e) => {
                log::error!("Failed to update manifest: {:#}", e);
                result.warnings.push(format!("Manifest not updated: {:#}", e));
            }
        }
    }

    // Stage 4: Reclaim emptied drop folders
    result.folders_removed = cleanup::prune_empty_directories(&layout.incoming) as u64;
    if result.folders_removed > 0 {
        progress_callback(
            "cleanup",
            1,
            1,
            &format!("Cleaned up {} empty folders", result.folders_removed),
        );
    }

    Ok(result)
}
