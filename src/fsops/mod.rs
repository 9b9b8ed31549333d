//! Applies validated file operations to the local filesystem.
//!
//! Writes go through a temp file in the destination directory followed by an
//! atomic rename, so a failed write never leaves an observable truncated
//! file. Creates are idempotent; edits are deliberately not (the snippet
//! search fails once the original text is gone).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::schema::{FileToCreate, FileToEdit};

#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("original snippet not found in '{path}'")]
    SnippetNotFound { path: String },
    #[error("original snippet occurs {count} times in '{path}'; refusing to guess which one to edit")]
    AmbiguousSnippet { path: String, count: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Skipped,
    Failed,
}

impl ApplyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyStatus::Applied => "applied",
            ApplyStatus::Skipped => "skipped",
            ApplyStatus::Failed => "failed",
        }
    }
}

/// Per-file result of one apply attempt. Results are independent across
/// files: a failure never aborts the remaining operations of a turn.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub path: String,
    pub status: ApplyStatus,
    pub detail: String,
}

impl ApplyOutcome {
    pub fn applied(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ApplyStatus::Applied,
            detail: detail.into(),
        }
    }

    pub fn skipped(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ApplyStatus::Skipped,
            detail: detail.into(),
        }
    }

    pub fn failed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ApplyStatus::Failed,
            detail: detail.into(),
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), FileOpError> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| FileOpError::Io(e.error))?;
    Ok(())
}

/// Compute the edited file content without touching the filesystem.
/// `original_snippet` must occur exactly once in `current`.
pub fn edited_content(current: &str, op: &FileToEdit) -> Result<String, FileOpError> {
    match current.matches(&op.original_snippet).count() {
        0 => Err(FileOpError::SnippetNotFound {
            path: op.path.clone(),
        }),
        1 => Ok(current.replacen(&op.original_snippet, &op.new_snippet, 1)),
        count => Err(FileOpError::AmbiguousSnippet {
            path: op.path.clone(),
            count,
        }),
    }
}

/// Write the file, creating parent directories as needed and overwriting any
/// existing content.
pub fn apply_create(op: &FileToCreate) -> ApplyOutcome {
    match write_atomic(Path::new(&op.path), &op.content) {
        Ok(()) => ApplyOutcome::applied(&op.path, format!("wrote {} bytes", op.content.len())),
        Err(e) => ApplyOutcome::failed(&op.path, e.to_string()),
    }
}

/// Replace the single occurrence of the original snippet. A failed edit
/// leaves the file byte-for-byte unchanged.
pub fn apply_edit(op: &FileToEdit) -> ApplyOutcome {
    let current = match fs::read_to_string(&op.path) {
        Ok(content) => content,
        Err(e) => return ApplyOutcome::failed(&op.path, FileOpError::from(e).to_string()),
    };

    match edited_content(&current, op)
        .and_then(|updated| write_atomic(Path::new(&op.path), &updated))
    {
        Ok(()) => ApplyOutcome::applied(&op.path, "replaced 1 occurrence"),
        Err(e) => ApplyOutcome::failed(&op.path, e.to_string()),
    }
}
