use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::DeleteMode;

/// Give up renaming after this many `name_N` attempts.
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("cannot move to trash: {0}")]
    Trash(#[from] trash::Error),

    #[error("file no longer exists")]
    Gone,

    #[error("destination {} is not a directory", .0.display())]
    NoDestination(PathBuf),

    #[error("file is already in {}", .0.display())]
    AlreadyInDestination(PathBuf),

    #[error("too many filename conflicts in {}", .0.display())]
    NameConflict(PathBuf),

    #[error("path has no file name")]
    NoFileName,
}

/// Destructive operations applied to matching files.
pub trait FileOps {
    fn delete(&self, path: &Path) -> Result<(), OpError>;

    /// Move `path` into `dest_dir`, returning where it ended up.
    fn move_into(&self, path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError>;
}

/// Operations on the real file system.
#[derive(Debug, Clone, Copy)]
pub struct DiskOps {
    delete_mode: DeleteMode,
}

impl DiskOps {
    pub fn new(delete_mode: DeleteMode) -> Self {
        Self { delete_mode }
    }
}

impl FileOps for DiskOps {
    fn delete(&self, path: &Path) -> Result<(), OpError> {
        if !path.exists() {
            return Err(OpError::Gone);
        }
        match self.delete_mode {
            DeleteMode::Permanent => fs::remove_file(path)?,
            DeleteMode::Trash => trash::delete(path)?,
        }
        tracing::debug!(path = %path.display(), mode = ?self.delete_mode, "deleted");
        Ok(())
    }

    fn move_into(&self, path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError> {
        let target = plan_move(path, dest_dir)?;

        if let Err(rename_err) = fs::rename(path, &target) {
            // rename cannot cross file systems; copy then remove instead
            tracing::debug!(error = %rename_err, "rename failed, falling back to copy");
            let options = fs_extra::file::CopyOptions::new();
            if fs_extra::file::move_file(path, &target, &options).is_err() {
                return Err(OpError::Io(rename_err));
            }
        }
        tracing::debug!(from = %path.display(), to = %target.display(), "moved");
        Ok(target)
    }
}

/// Preview operations: validate like [`DiskOps`] but never touch a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunOps;

impl FileOps for DryRunOps {
    fn delete(&self, path: &Path) -> Result<(), OpError> {
        if !path.exists() {
            return Err(OpError::Gone);
        }
        Ok(())
    }

    fn move_into(&self, path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError> {
        plan_move(path, dest_dir)
    }
}

/// Check a move is possible and pick a free target name.
fn plan_move(path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError> {
    if !dest_dir.is_dir() {
        return Err(OpError::NoDestination(dest_dir.to_path_buf()));
    }
    if !path.exists() {
        return Err(OpError::Gone);
    }
    if let Some(parent) = path.parent() {
        if same_dir(parent, dest_dir) {
            return Err(OpError::AlreadyInDestination(dest_dir.to_path_buf()));
        }
    }
    unique_destination(path, dest_dir)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    let a = if a.as_os_str().is_empty() { Path::new(".") } else { a };
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `dest_dir/name.ext`, or `dest_dir/name_N.ext` when that is taken.
fn unique_destination(path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError> {
    let file_name = path.file_name().ok_or(OpError::NoFileName)?;
    let candidate = dest_dir.join(file_name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let extension = path.extension().map(|ext| ext.to_string_lossy());

    for counter in 1..=MAX_NAME_ATTEMPTS {
        let name = match &extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let candidate = dest_dir.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(OpError::NameConflict(dest_dir.to_path_buf()))
}
