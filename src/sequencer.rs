/// Sequencing engine for ordered folder lists.
///
/// This module turns a user-ordered list of subdirectory names into a
/// conflict-free set of renames with zero-padded `NN_` prefixes, and can
/// strip those prefixes back off. Planning and execution are separate
/// steps: the full rename plan is computed before any filesystem mutation,
/// so a collision discovered late never forces re-planning of earlier
/// entries.
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One immediate subdirectory of the open base path.
///
/// Ephemeral: rebuilt on every listing refresh. Ordering among entries is
/// user-defined (list order), not derived from `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// The folder name (no path components).
    pub name: String,
    /// Whether this folder is excluded from sequencing.
    pub reserved: bool,
}

/// A single computed rename. Never persisted; lives for one planning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlanEntry {
    /// Current on-disk name.
    pub old_name: String,
    /// Target name, collision-free within the plan.
    pub new_name: String,
}

/// Classification of a failed rename, derived from the OS error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameErrorKind {
    /// Target is locked or in use by another process.
    Busy,
    /// Destination name collides with an existing, unrelated entry.
    AlreadyExists,
    /// Source vanished between listing and rename.
    NotFound,
    /// Any other I/O failure.
    Other,
}

/// Maps an OS error onto the rename error taxonomy.
///
/// Permission-denied and busy/sharing-violation style errors all count as
/// `Busy`: on Windows a folder open in another program surfaces as either.
pub fn classify_io_error(error: &io::Error) -> RenameErrorKind {
    match error.kind() {
        io::ErrorKind::NotFound => RenameErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => RenameErrorKind::AlreadyExists,
        io::ErrorKind::PermissionDenied => RenameErrorKind::Busy,
        _ => match error.raw_os_error() {
            // EBUSY on Unix, ERROR_SHARING_VIOLATION on Windows.
            Some(16) | Some(32) => RenameErrorKind::Busy,
            _ => RenameErrorKind::Other,
        },
    }
}

/// Errors that can occur before a batch starts (the batch itself is
/// best-effort and reports per-entry outcomes instead of failing).
#[derive(Debug)]
pub enum SequenceError {
    /// The base directory path is invalid or doesn't exist.
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read the directory listing.
    ListingFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::ListingFailed { path, source } => {
                write!(f, "Failed to list directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Result type for sequencing operations.
pub type SequenceResult<T> = Result<T, SequenceError>;

/// Outcome of executing a rename batch.
///
/// A failure on one entry never aborts the batch, so partial success is an
/// expected, reportable state rather than an error.
#[derive(Debug, Default)]
pub struct SequenceReport {
    /// Renames that were applied to disk.
    pub renamed: Vec<RenamePlanEntry>,
    /// Entries whose source vanished before the rename (external deletion).
    pub skipped: Vec<String>,
    /// Entries already carrying their target name; no mutation performed.
    pub unchanged: usize,
    /// Non-fatal busy/locked conditions, with the folder name.
    pub warnings: Vec<(String, String)>,
    /// Other per-entry failures, with the folder name and OS message.
    pub failures: Vec<(String, String)>,
}

impl SequenceReport {
    /// Returns true if every entry either renamed cleanly or was a no-op.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty() && self.failures.is_empty()
    }

    /// Total number of entries the batch touched in any way.
    pub fn total_processed(&self) -> usize {
        self.renamed.len()
            + self.skipped.len()
            + self.unchanged
            + self.warnings.len()
            + self.failures.len()
    }
}

/// Normalizes a folder name for collision comparison.
///
/// Windows and macOS filesystems are case-insensitive by default, so two
/// names differing only in case would collide on disk there.
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Normalizes a folder name for collision comparison.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn normalize_name(name: &str) -> String {
    name.to_string()
}

/// Lists the immediate subdirectory names of `base_path`, sorted.
///
/// Non-directory entries and names that are not valid UTF-8 are skipped.
pub fn list_folders(base_path: &Path) -> SequenceResult<Vec<String>> {
    let entries = fs::read_dir(base_path).map_err(|e| SequenceError::ListingFailed {
        path: base_path.to_path_buf(),
        source: e,
    })?;

    let mut folders: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    folders.sort();
    Ok(folders)
}

/// Plans and executes sequence renames and prefix clearing.
pub struct Sequencer {
    prefix: Regex,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            prefix: Regex::new(r"^\d+_?").expect("Invalid prefix pattern"),
        }
    }
}

impl Sequencer {
    /// Strips a leading `NN_` prefix from a folder name.
    ///
    /// Falls back to the original name if stripping would leave nothing
    /// (a folder literally named `07_` keeps its name).
    pub fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        match self.prefix.find(name) {
            Some(m) if m.end() < name.len() => &name[m.end()..],
            _ => name,
        }
    }

    /// Computes the rename plan for a user-ordered folder list.
    ///
    /// Walks `ordered_names` maintaining a 1-based counter that increments
    /// only for non-reserved entries; reserved entries keep their name and
    /// do not consume a sequence number. Each non-reserved entry gets the
    /// candidate `{index:02}_{base}`; if that collides (case-normalized)
    /// with an earlier claim in this batch or with an on-disk name other
    /// than the entry's own, a ` (n)` counter is appended and incremented
    /// until the name is free. The probing is intentionally unbounded.
    ///
    /// # Arguments
    ///
    /// * `base_path` - The directory whose subdirectories are being ordered
    /// * `ordered_names` - The listing in the user's current visual order
    /// * `reserved` - Names excluded from sequencing
    ///
    /// # Errors
    ///
    /// Returns an error only if the base path cannot be listed; collisions
    /// never error, they are resolved in the plan.
    pub fn plan_sequence(
        &self,
        base_path: &Path,
        ordered_names: &[String],
        reserved: &BTreeSet<String>,
    ) -> SequenceResult<Vec<RenamePlanEntry>> {
        if !base_path.is_dir() {
            return Err(SequenceError::InvalidBasePath {
                path: base_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "base path is not a directory"),
            });
        }

        // Snapshot the current on-disk names so candidates can avoid
        // colliding with entries that are not part of this batch.
        let on_disk: HashSet<String> = list_folders(base_path)?
            .iter()
            .map(|n| normalize_name(n))
            .collect();

        let mut claimed: HashSet<String> = HashSet::new();
        let mut plan = Vec::new();
        let mut index = 0usize;

        for name in ordered_names {
            if reserved.contains(name) {
                continue;
            }
            index += 1;

            let base_name = self.strip_prefix(name);
            let own = normalize_name(name);
            let mut candidate = format!("{:02}_{}", index, base_name);
            let mut counter = 1usize;
            loop {
                let normalized = normalize_name(&candidate);
                let taken_in_batch = claimed.contains(&normalized);
                let taken_on_disk = on_disk.contains(&normalized) && normalized != own;
                if !taken_in_batch && !taken_on_disk {
                    claimed.insert(normalized);
                    break;
                }
                candidate = format!("{:02}_{} ({})", index, base_name, counter);
                counter += 1;
            }

            plan.push(RenamePlanEntry {
                old_name: name.clone(),
                new_name: candidate,
            });
        }

        Ok(plan)
    }

    /// Executes a rename plan against the filesystem.
    ///
    /// Per-entry failure semantics:
    /// * source no longer exists: skipped silently (external deletion race)
    /// * old and new name identical under case normalization: no-op
    /// * target busy/locked: recorded as a warning, batch continues
    /// * any other error: recorded as a failure, batch continues
    ///
    /// `on_entry` is invoked once per plan entry after it is processed,
    /// for progress reporting.
    pub fn apply_plan(
        &self,
        base_path: &Path,
        plan: &[RenamePlanEntry],
        mut on_entry: impl FnMut(&RenamePlanEntry),
    ) -> SequenceReport {
        let mut report = SequenceReport::default();

        for entry in plan {
            self.apply_one(base_path, entry, &mut report);
            on_entry(entry);
        }

        report
    }

    fn apply_one(&self, base_path: &Path, entry: &RenamePlanEntry, report: &mut SequenceReport) {
        if normalize_name(&entry.old_name) == normalize_name(&entry.new_name) {
            report.unchanged += 1;
            return;
        }

        let old_path = base_path.join(&entry.old_name);
        let new_path = base_path.join(&entry.new_name);

        if !old_path.exists() {
            report.skipped.push(entry.old_name.clone());
            return;
        }

        match fs::rename(&old_path, &new_path) {
            Ok(()) => report.renamed.push(entry.clone()),
            Err(e) => match classify_io_error(&e) {
                RenameErrorKind::NotFound => report.skipped.push(entry.old_name.clone()),
                RenameErrorKind::Busy => report
                    .warnings
                    .push((entry.old_name.clone(), e.to_string())),
                _ => report
                    .failures
                    .push((entry.old_name.clone(), e.to_string())),
            },
        }
    }

    /// Plans and executes sequence renames in one call.
    pub fn apply_sequence(
        &self,
        base_path: &Path,
        ordered_names: &[String],
        reserved: &BTreeSet<String>,
    ) -> SequenceResult<SequenceReport> {
        let plan = self.plan_sequence(base_path, ordered_names, reserved)?;
        Ok(self.apply_plan(base_path, &plan, |_| {}))
    }

    /// Strips the `NN_` prefix from every non-reserved folder on disk.
    ///
    /// An entry is left alone, without raising an error, when stripping
    /// yields an empty name, changes nothing, or would collide
    /// (case-normalized) with another current on-disk name. A second
    /// invocation therefore performs no mutations.
    pub fn clear_prefixes(
        &self,
        base_path: &Path,
        reserved: &BTreeSet<String>,
    ) -> SequenceResult<SequenceReport> {
        let folders = list_folders(base_path)?;
        let mut current: HashSet<String> = folders.iter().map(|n| normalize_name(n)).collect();
        let mut report = SequenceReport::default();

        for name in &folders {
            if reserved.contains(name) {
                continue;
            }
            let stripped = self.strip_prefix(name);
            if stripped == name {
                report.unchanged += 1;
                continue;
            }
            let normalized = normalize_name(stripped);
            if current.contains(&normalized) {
                // Already-clean or colliding names are left alone.
                report.unchanged += 1;
                continue;
            }

            let entry = RenamePlanEntry {
                old_name: name.clone(),
                new_name: stripped.to_string(),
            };
            let before = report.renamed.len();
            self.apply_one(base_path, &entry, &mut report);
            if report.renamed.len() > before {
                current.remove(&normalize_name(name));
                current.insert(normalized);
            }
        }

        Ok(report)
    }
}
