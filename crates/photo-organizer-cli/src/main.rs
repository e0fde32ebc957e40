use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use photo_organizer_core::{LibraryLayout, OrganizeOptions, PlanAction, ProcessResult};

#[derive(Parser)]
#[command(
    name = "photo-organizer",
    version,
    about = "Organize photos by capture date",
    after_help = "Examples:\n  photo-organizer                  Preview (dry-run, default)\n  photo-organizer -x               Execute file moves\n  photo-organizer -x -m            Execute and update manifest\n  photo-organizer --root /path     Use custom root directory\n  photo-organizer --init           Initialize photo library structure"
)]
struct Cli {
    /// Actually move files (default is dry-run)
    #[arg(short = 'x', long)]
    execute: bool,

    /// Update the manifest CSV after organizing
    #[arg(short = 'm', long)]
    update_manifest: bool,

    /// Photo library root directory (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Initialize photo library directory structure
    #[arg(long)]
    init: bool,

    /// Print the run result as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Log every date decision and move
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    if cli.init {
        return init_library(&LibraryLayout::new(root));
    }

    let options = OrganizeOptions {
        root,
        execute: cli.execute,
        update_manifest: cli.update_manifest,
    };

    if cli.json {
        let result = photo_organizer_core::process(&options, &|_, _, _, _| {})?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let layout = LibraryLayout::new(&options.root);
    println!("{}", "=".repeat(50));
    println!("Photo Organizer");
    println!("{}", "=".repeat(50));
    println!("Incoming:  {}", layout.incoming.display());
    println!("Originals: {}", layout.originals.display());
    println!();
    if !options.execute {
        println!("[DRY RUN MODE - use --execute or -x to actually move files]");
        println!();
    }

    // Per-file lines come from the result; only errors are reported as they happen
    let result = photo_organizer_core::process(&options, &|stage, _, _, message| match stage {
        "scan" => println!("{}\n", message),
        "error" => eprintln!("  Error: {}", message),
        _ => {}
    })?;

    for line in file_lines(&result, &layout.root, options.execute) {
        println!("{}", line);
    }
    print_summary(&result, options.execute);
    Ok(())
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// One entry per file: moved (or planned) files first, then duplicates.
fn file_lines(result: &ProcessResult, root: &Path, execute: bool) -> Vec<String> {
    let mut lines: Vec<String> = if execute {
        result
            .moved
            .iter()
            .map(|r| format!("  {}\n    → {}", relative(root, &r.source), relative(root, &r.destination)))
            .collect()
    } else {
        result
            .plans
            .iter()
            .filter(|p| p.action != PlanAction::SkipDuplicate)
            .map(|p| format!("  {}\n    → {}", relative(root, &p.source), relative(root, &p.destination)))
            .collect()
    };
    lines.extend(
        result
            .plans
            .iter()
            .filter(|p| p.action == PlanAction::SkipDuplicate)
            .map(|p| format!("  {} (duplicate, skipped)", relative(root, &p.source))),
    );
    lines
}

fn print_summary(result: &ProcessResult, execute: bool) {
    println!();
    if result.discovered == 0 {
        println!("No new files found in Incoming/");
    } else if execute {
        println!("Organized {} files", result.organized);
        if result.duplicates_skipped > 0 {
            println!("Skipped {} duplicates", result.duplicates_skipped);
        }
        if result.failed > 0 {
            println!("Failed {} files", result.failed);
        }
        if result.manifest_entries_added > 0 {
            println!("Added {} entries to manifest", result.manifest_entries_added);
        }
        if result.folders_removed > 0 {
            println!("Cleaned up {} empty folders", result.folders_removed);
        }
    } else {
        println!("[DRY RUN] Would organize {} files", result.organized);
        if result.duplicates_skipped > 0 {
            println!("[DRY RUN] Would skip {} duplicates", result.duplicates_skipped);
        }
    }

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!("\nDone!");
}

fn init_library(layout: &LibraryLayout) -> anyhow::Result<()> {
    println!("Initializing photo library at: {}\n", layout.root.display());

    let report = layout.init()?;
    for (dir, created) in &report {
        let name = dir.file_name().unwrap_or_default().to_string_lossy();
        if *created {
            println!("✓ {}/", name);
        } else {
            println!("⊘ {} (already exists)", name);
        }
    }

    let created = report.iter().filter(|(_, c)| *c).count();
    println!();
    if created > 0 {
        println!("Created {} directories", created);
    }
    if created < report.len() {
        println!("Skipped {} existing directories", report.len() - created);
    }

    println!("\nPhoto library is ready!");
    println!("Next steps:");
    println!("  1. Copy photos to Incoming/");
    println!("  2. Run: photo-organizer (preview)");
    println!("  3. Run: photo-organizer -x (organize)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_organizer_core::{MovedFileRecord, OrganizePlan};

    fn plan(source: &str, destination: &str, action: PlanAction) -> OrganizePlan {
        OrganizePlan {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
            capture_date: Default::default(),
            size: 1,
            action,
        }
    }

    #[test]
    fn test_file_lines_keep_arrows_in_names() {
        let root = Path::new("/lib");
        let result = ProcessResult {
            plans: vec![
                plan("/lib/Incoming/a -> b.jpg", "/lib/Originals/2024/2024-01-01/a -> b.jpg", PlanAction::Move),
                plan("/lib/Incoming/dup.jpg", "/lib/Originals/2024/2024-01-01/dup.jpg", PlanAction::SkipDuplicate),
            ],
            ..Default::default()
        };

        assert_eq!(
            file_lines(&result, root, false),
            vec![
                "  Incoming/a -> b.jpg\n    → Originals/2024/2024-01-01/a -> b.jpg".to_string(),
                "  Incoming/dup.jpg (duplicate, skipped)".to_string(),
            ]
        );
    }

    #[test]
    fn test_file_lines_commit_uses_actual_destination() {
        let root = Path::new("/lib");
        let planned = plan("/lib/Incoming/x.jpg", "/lib/Originals/2024/2024-01-01/x.jpg", PlanAction::Move);
        let result = ProcessResult {
            moved: vec![MovedFileRecord {
                source: planned.source.clone(),
                destination: PathBuf::from("/lib/Originals/2024/2024-01-01/x_1.jpg"),
                relative_path: "Originals/2024/2024-01-01/x_1.jpg".to_string(),
                source_folder: "x.jpg".to_string(),
                size: 1,
                modified: Default::default(),
                capture_date: Default::default(),
                hash: None,
            }],
            plans: vec![planned],
            ..Default::default()
        };

        assert_eq!(
            file_lines(&result, root, true),
            vec!["  Incoming/x.jpg\n    → Originals/2024/2024-01-01/x_1.jpg".to_string()]
        );
    }
}
