/// Manual folder operations: create, rename, delete.
///
/// Unlike automated sequencing, a manual rename onto an existing name is
/// a user-facing error rather than something to resolve with a counter
/// suffix — the user asked for that exact name. Creation, on the other
/// hand, quietly probes `name(1)`, `name(2)`… because the user asked for
/// "a new folder called roughly this". Deletion is a best-effort batch.
use crate::sequencer::{RenameErrorKind, classify_io_error, normalize_name};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from single-folder manual operations.
#[derive(Debug)]
pub enum FolderOpError {
    /// The base directory path is invalid or doesn't exist.
    InvalidBasePath { path: PathBuf },
    /// A folder with the requested name already exists.
    NameTaken { name: String },
    /// The folder to operate on no longer exists.
    SourceMissing { name: String },
    /// The underlying filesystem call failed.
    IoFailure {
        name: String,
        source: std::io::Error,
    },
}

impl std::fmt::Display for FolderOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path } => {
                write!(f, "Invalid base path: {}", path.display())
            }
            Self::NameTaken { name } => {
                write!(f, "A folder named {} already exists", name)
            }
            Self::SourceMissing { name } => {
                write!(f, "Folder {} no longer exists", name)
            }
            Self::IoFailure { name, source } => {
                write!(f, "Operation on {} failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for FolderOpError {}

/// Outcome of a best-effort folder deletion batch.
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Names removed from disk.
    pub deleted: Vec<String>,
    /// Per-name failures with the OS message.
    pub failures: Vec<(String, String)>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Creates a subdirectory of `base_path`, probing for a free name.
///
/// If `name` is taken, `name(1)`, `name(2)`… are tried until one is free.
/// Returns the name actually created.
pub fn create_folder(base_path: &Path, name: &str) -> Result<String, FolderOpError> {
    if !base_path.is_dir() {
        return Err(FolderOpError::InvalidBasePath {
            path: base_path.to_path_buf(),
        });
    }

    let mut candidate = name.to_string();
    let mut counter = 1usize;
    while base_path.join(&candidate).exists() {
        candidate = format!("{}({})", name, counter);
        counter += 1;
    }

    fs::create_dir(base_path.join(&candidate)).map_err(|e| FolderOpError::IoFailure {
        name: candidate.clone(),
        source: e,
    })?;
    Ok(candidate)
}

/// Renames a single folder at the user's request.
///
/// Aborts with `NameTaken` when the destination exists as an unrelated
/// entry; a pure case change of the same folder is allowed on
/// case-insensitive filesystems.
pub fn rename_folder(base_path: &Path, old: &str, new: &str) -> Result<(), FolderOpError> {
    let old_path = base_path.join(old);
    let new_path = base_path.join(new);

    if !old_path.exists() {
        return Err(FolderOpError::SourceMissing {
            name: old.to_string(),
        });
    }
    if normalize_name(old) != normalize_name(new) && new_path.exists() {
        return Err(FolderOpError::NameTaken {
            name: new.to_string(),
        });
    }

    fs::rename(&old_path, &new_path).map_err(|e| match classify_io_error(&e) {
        RenameErrorKind::AlreadyExists => FolderOpError::NameTaken {
            name: new.to_string(),
        },
        RenameErrorKind::NotFound => FolderOpError::SourceMissing {
            name: old.to_string(),
        },
        _ => FolderOpError::IoFailure {
            name: old.to_string(),
            source: e,
        },
    })
}

/// Deletes folders recursively, best-effort.
///
/// A failure on one folder never aborts the batch. Folders that are
/// already gone count as deleted.
pub fn delete_folders(base_path: &Path, names: &[String]) -> DeleteReport {
    let mut report = DeleteReport::default();
    for name in names {
        let path = base_path.join(name);
        if !path.exists() {
            report.deleted.push(name.clone());
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => report.deleted.push(name.clone()),
            Err(e) => report.failures.push((name.clone(), e.to_string())),
        }
    }
    report
}
