use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date;
use crate::fingerprint;
use crate::layout::LibraryLayout;
use crate::planner::{self, OrganizePlan, PlanAction};

/// A file that now lives in the archive tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovedFileRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Destination path relative to the library root; the ledger key
    pub relative_path: String,
    /// Top-level folder under Incoming/ the file came from
    pub source_folder: String,
    pub size: u64,
    pub modified: NaiveDateTime,
    /// Resolved again from the destination after the move
    pub capture_date: NaiveDateTime,
    /// SHA-256 of the first 64 KiB, None if unreadable
    pub hash: Option<String>,
}

#[derive(Debug)]
pub enum MoveOutcome {
    Moved(MovedFileRecord),
    Skipped,
}

pub struct Mover<'a> {
    layout: &'a LibraryLayout,
}

impl<'a> Mover<'a> {
    pub fn new(layout: &'a LibraryLayout) -> Self {
        Self { layout }
    }

    /// Carry out a plan. The collision policy is applied again against the
    /// live filesystem, since the destination may have changed since planning.
    pub fn execute(&self, plan: &OrganizePlan) -> anyhow::Result<MoveOutcome> {
        if plan.action == PlanAction::SkipDuplicate {
            return Ok(MoveOutcome::Skipped);
        }

        let mut destination = plan.destination.clone();
        if destination.exists() {
            let base = planner::destination_for(&plan.source, plan.capture_date, &self.layout.originals);
            let size = fs::metadata(&plan.source)
                .with_context(|| format!("Failed to stat {}", plan.source.display()))?
                .len();
            let (resolved, action) = planner::resolve_collision(&base, size, planner::disk_occupant);
            if action == PlanAction::SkipDuplicate {
                log::info!("{} appeared at destination, skipping", base.display());
                return Ok(MoveOutcome::Skipped);
            }
            destination = resolved;
        }

        if let Some(dir) = destination.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        move_file(&plan.source, &destination)?;
        log::info!("Moved {} -> {}", plan.source.display(), destination.display());

        let meta = fs::metadata(&destination)
            .with_context(|| format!("Failed to stat {}", destination.display()))?;
        let modified = match meta.modified() {
            Ok(time) => DateTime::<Local>::from(time).naive_local(),
            Err(e) => {
                log::warn!(
                    "No modification time for {} ({}), recording capture date",
                    destination.display(),
                    e
                );
                plan.capture_date
            }
        };

        Ok(MoveOutcome::Moved(MovedFileRecord {
            relative_path: self.layout.relative_key(&destination),
            source_folder: self.layout.source_folder(&plan.source),
            source: plan.source.clone(),
            size: meta.len(),
            modified,
            capture_date: date::resolve_capture_date(&destination),
            hash: fingerprint::content_fingerprint(&destination),
            destination,
        }))
    }
}

/// Rename, falling back to copy + delete when the rename fails
/// (e.g. source and destination on different volumes).
pub fn move_file(source: &Path, destination: &Path) -> anyhow::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("Rename failed ({}), copying {}", e, source.display());
            copy_then_remove(source, destination)
        }
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> anyhow::Result<()> {
    if let Err(e) = copy_preserving_mtime(source, destination) {
        // Don't leave a truncated file behind in the archive
        let _ = fs::remove_file(destination);
        return Err(e).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), destination.display())
        });
    }

    // The copy is complete, a stale source is only cosmetic
    if let Err(e) = fs::remove_file(source) {
        log::warn!("Copied but could not remove {}: {}", source.display(), e);
    }
    Ok(())
}

fn copy_preserving_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    let mut input = File::open(source)?;
    let mut output = io::BufWriter::new(File::create(destination)?);
    io::copy(&mut input, &mut output)?;
    output.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    let meta = input.metadata()?;
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(destination, mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, LibraryLayout) {
        let dir = tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path());
        fs::create_dir_all(layout.incoming.join("trip")).unwrap();
        (dir, layout)
    }

    fn plan_for(layout: &LibraryLayout, source: &Path) -> OrganizePlan {
        planner::Planner::new(&layout.originals)
            .plan(&crate::media::CapturedFile::new(source.to_path_buf()))
            .unwrap()
    }

    #[test]
    fn test_execute_moves_and_records() {
        let (_dir, layout) = setup();
        let src = layout.incoming.join("trip").join("DJI_20250619224111_0001_D.MP4");
        fs::write(&src, b"drone footage").unwrap();

        let plan = plan_for(&layout, &src);
        let record = match Mover::new(&layout).execute(&plan).unwrap() {
            MoveOutcome::Moved(r) => r,
            MoveOutcome::Skipped => panic!("expected a move"),
        };

        assert!(!src.exists());
        assert_eq!(fs::read(&record.destination).unwrap(), b"drone footage");
        assert_eq!(
            record.destination,
            layout.originals.join("2025").join("2025-06-19").join("DJI_20250619224111_0001_D.MP4")
        );
        assert_eq!(record.size, 13);
        assert_eq!(record.source_folder, "trip");
        assert_eq!(
            record.relative_path,
            Path::new("Originals")
                .join("2025")
                .join("2025-06-19")
                .join("DJI_20250619224111_0001_D.MP4")
                .to_string_lossy()
        );
        assert_eq!(
            record.capture_date,
            NaiveDate::from_ymd_opt(2025, 6, 19).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(record.hash, fingerprint::content_fingerprint(&record.destination));
    }

    #[test]
    fn test_execute_records_file_mtime() {
        let (_dir, layout) = setup();
        let src = layout.incoming.join("trip").join("IMG_20240101_000000.jpg");
        fs::write(&src, b"photo").unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        let plan = plan_for(&layout, &src);
        let record = match Mover::new(&layout).execute(&plan).unwrap() {
            MoveOutcome::Moved(r) => r,
            MoveOutcome::Skipped => panic!("expected a move"),
        };

        let expected = chrono::DateTime::from_timestamp(1_600_000_000, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(record.modified, expected);
        assert_ne!(record.modified, record.capture_date);
    }

    #[test]
    fn test_execute_skip_duplicate_touches_nothing() {
        let (_dir, layout) = setup();
        let src = layout.incoming.join("IMG_20240101_000000.jpg");
        fs::write(&src, b"same").unwrap();
        let dest_dir = layout.originals.join("2024").join("2024-01-01");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("IMG_20240101_000000.jpg"), b"SAME").unwrap();

        let plan = plan_for(&layout, &src);
        assert_eq!(plan.action, PlanAction::SkipDuplicate);
        assert!(matches!(Mover::new(&layout).execute(&plan).unwrap(), MoveOutcome::Skipped));
        assert!(src.exists());
    }

    #[test]
    fn test_execute_rechecks_destination() {
        let (_dir, layout) = setup();
        let src = layout.incoming.join("IMG_20240101_000000.jpg");
        fs::write(&src, b"incoming").unwrap();
        let plan = plan_for(&layout, &src);
        assert_eq!(plan.action, PlanAction::Move);

        // Something lands at the destination between planning and execution
        fs::create_dir_all(plan.destination.parent().unwrap()).unwrap();
        fs::write(&plan.destination, b"someone else").unwrap();

        let record = match Mover::new(&layout).execute(&plan).unwrap() {
            MoveOutcome::Moved(r) => r,
            MoveOutcome::Skipped => panic!("expected a move"),
        };
        assert_eq!(record.destination, planner::suffixed_path(&plan.destination, 1));
        assert_eq!(fs::read(&plan.destination).unwrap(), b"someone else");
    }

    #[test]
    fn test_execute_missing_source_errors() {
        let (_dir, layout) = setup();
        let src = layout.incoming.join("IMG_20240101_000000.jpg");
        fs::write(&src, b"x").unwrap();
        let plan = plan_for(&layout, &src);
        fs::remove_file(&src).unwrap();

        assert!(Mover::new(&layout).execute(&plan).is_err());
    }

    #[test]
    fn test_copy_then_remove_keeps_mtime() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.mov");
        let dest = dir.path().join("b.mov");
        fs::write(&src, b"payload").unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        copy_then_remove(&src, &dest).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        let meta = fs::metadata(&dest).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), mtime);
    }

    #[test]
    fn test_copy_failure_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("b.mov");
        assert!(copy_then_remove(&dir.path().join("missing.mov"), &dest).is_err());
        assert!(!dest.exists());
    }
}
