use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::date;
use crate::media::CapturedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    /// Destination is free
    Move,
    /// Same-named file of the same size is already archived
    SkipDuplicate,
    /// Same-named file of a different size is archived, a `_N` suffix was added
    RenameCollision,
}

/// Where one incoming file should go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizePlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub capture_date: NaiveDateTime,
    /// Source size at planning time
    pub size: u64,
    pub action: PlanAction,
}

/// `<archive_root>/<YYYY>/<YYYY-MM-DD>/<original filename>`
pub fn destination_for(source: &Path, date: NaiveDateTime, archive_root: &Path) -> PathBuf {
    let year = date.format("%Y").to_string();
    let day = date.format("%Y-%m-%d").to_string();
    let filename = source.file_name().unwrap_or(source.as_os_str());
    archive_root.join(year).join(day).join(filename)
}

/// Canonical archive path for a source file, before collision handling.
pub fn plan_destination(source: &Path, archive_root: &Path) -> PathBuf {
    destination_for(source, date::resolve_capture_date(source), archive_root)
}

/// `name.jpg` -> `name_<n>.jpg`
pub fn suffixed_path(base: &Path, n: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let new_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    base.with_file_name(new_name)
}

/// Apply the collision policy to a canonical destination.
/// `occupant` reports the size of whatever already sits at a path.
pub fn resolve_collision(
    base: &Path,
    source_size: u64,
    occupant: impl Fn(&Path) -> Option<u64>,
) -> (PathBuf, PlanAction) {
    match occupant(base) {
        None => (base.to_path_buf(), PlanAction::Move),
        Some(size) if size == source_size => (base.to_path_buf(), PlanAction::SkipDuplicate),
        Some(_) => {
            let mut counter = 1u32;
            loop {
                let candidate = suffixed_path(base, counter);
                if occupant(&candidate).is_none() {
                    break (candidate, PlanAction::RenameCollision);
                }
                counter += 1;
            }
        }
    }
}

/// Size of the file on disk at `path`, if any.
pub fn disk_occupant(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Plans destinations for one run. Destinations handed out earlier in the run
/// count as occupied, so previews match what a commit would do.
pub struct Planner {
    archive_root: PathBuf,
    claimed: HashMap<PathBuf, u64>,
}

impl Planner {
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
            claimed: HashMap::new(),
        }
    }

    fn occupant(&self, path: &Path) -> Option<u64> {
        self.claimed.get(path).copied().or_else(|| disk_occupant(path))
    }

    pub fn plan(&self, file: &CapturedFile) -> anyhow::Result<OrganizePlan> {
        let size = fs::metadata(&file.path)
            .with_context(|| format!("Failed to stat {}", file.path.display()))?
            .len();
        let capture_date = date::resolve_capture_date(&file.path);
        let base = destination_for(&file.path, capture_date, &self.archive_root);
        let (destination, action) = resolve_collision(&base, size, |p| self.occupant(p));

        Ok(OrganizePlan {
            source: file.path.clone(),
            destination,
            capture_date,
            size,
            action,
        })
    }

    /// Record that a plan's destination is taken for the rest of the run.
    pub fn claim(&mut self, plan: &OrganizePlan) {
        if plan.action != PlanAction::SkipDuplicate {
            self.claim_path(&plan.destination, plan.size);
        }
    }

    /// Record a path a file actually landed at.
    pub fn claim_path(&mut self, destination: &Path, size: u64) {
        self.claimed.insert(destination.to_path_buf(), size);
    }
}
