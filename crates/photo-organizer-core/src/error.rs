use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop a run before any file is touched.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Incoming directory not found at {}", .0.display())]
    MissingIncoming(PathBuf),
}
