/// Session facade owning the persisted state and the per-directory stores.
///
/// The UI (or CLI) is a caller of this object, never an owner of the
/// logic: it supplies ordered name lists, confirm triggers and marking
/// events, and reads back listings and reports. All operations are
/// serialized on the caller's thread; the only asynchronous input is the
/// watcher channel, which is drained through `pump_watcher` so refreshes
/// never run inside a notification callback.
use crate::folder_ops::{self, DeleteReport, FolderOpError};
use crate::notes::{Note, NoteCategory, NoteError, NotesStore};
use crate::reservations::ReservationStore;
use crate::sequencer::{
    FolderEntry, RenamePlanEntry, SequenceError, SequenceReport, Sequencer, list_folders,
};
use crate::state::PersistedState;
use crate::watcher::DirectoryWatcher;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Errors surfaced by session operations.
#[derive(Debug)]
pub enum SessionError {
    /// No directory is currently open.
    NoOpenDirectory,
    /// A sequencing operation could not start.
    Sequence(SequenceError),
    /// A manual folder operation failed.
    FolderOp(FolderOpError),
    /// A notes operation was rejected.
    Note(NoteError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOpenDirectory => write!(f, "No directory is open"),
            Self::Sequence(e) => write!(f, "{}", e),
            Self::FolderOp(e) => write!(f, "{}", e),
            Self::Note(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SequenceError> for SessionError {
    fn from(e: SequenceError) -> Self {
        Self::Sequence(e)
    }
}

impl From<FolderOpError> for SessionError {
    fn from(e: FolderOpError) -> Self {
        Self::FolderOp(e)
    }
}

impl From<NoteError> for SessionError {
    fn from(e: NoteError) -> Self {
        Self::Note(e)
    }
}

/// One running instance of the folder sequencing engine.
pub struct Session {
    state_path: PathBuf,
    last_path: String,
    open_dir: Option<PathBuf>,
    last_listing: Vec<String>,
    sequencer: Sequencer,
    reservations: ReservationStore,
    notes: NotesStore,
    ui_prefs: Value,
    watcher: DirectoryWatcher,
}

impl Session {
    /// Loads session state from `state_path`; never fails (see
    /// [`PersistedState::load`] for the defensive rules).
    pub fn load(state_path: PathBuf) -> Self {
        let state = PersistedState::load(&state_path);
        Self {
            state_path,
            last_path: state.last_path,
            open_dir: None,
            last_listing: Vec::new(),
            sequencer: Sequencer::default(),
            reservations: ReservationStore::from_map(state.reserved),
            notes: NotesStore::from_notes(state.notes),
            ui_prefs: state.ui_prefs,
            watcher: DirectoryWatcher::new(),
        }
    }

    /// The last directory a session had open, possibly from a prior run.
    pub fn last_path(&self) -> &str {
        &self.last_path
    }

    /// The currently open directory.
    pub fn open_dir(&self) -> Option<&Path> {
        self.open_dir.as_deref()
    }

    /// Opens a directory: lists it, reconciles reservations against the
    /// listing, starts watching it and persists it as the last path.
    pub fn open(&mut self, dir: &Path) -> Result<Vec<FolderEntry>, SessionError> {
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let listing = list_folders(&dir).map_err(SessionError::Sequence)?;

        self.last_path = dir.to_string_lossy().to_string();
        self.open_dir = Some(dir.clone());
        self.last_listing = listing;

        self.reservations
            .reconcile(&self.last_path, &self.last_listing);
        // The path changed, so state is rewritten regardless of pruning.
        self.persist();

        if let Err(e) = self.watcher.watch(&dir) {
            // Watching is best-effort; the engine still works via manual
            // refreshes when the platform backend is unavailable.
            eprintln!("Warning: Could not watch {}: {}", dir.display(), e);
        }

        Ok(self.entries())
    }

    /// Re-opens the last path from a previous run, if it still exists.
    pub fn open_last(&mut self) -> Result<Vec<FolderEntry>, SessionError> {
        if self.last_path.is_empty() {
            return Err(SessionError::NoOpenDirectory);
        }
        let dir = PathBuf::from(self.last_path.clone());
        self.open(&dir)
    }

    /// The current listing with reservation flags applied.
    pub fn entries(&self) -> Vec<FolderEntry> {
        let dir = self.last_path.clone();
        self.last_listing
            .iter()
            .map(|name| FolderEntry {
                name: name.clone(),
                reserved: self.reservations.is_reserved(&dir, name),
            })
            .collect()
    }

    /// Sequences the open directory according to `ordered_names`.
    ///
    /// Reads the reservation store to know which entries to skip, executes
    /// the renames, refreshes the listing and reconciles reservations.
    pub fn apply_sort(&mut self, ordered_names: &[String]) -> Result<SequenceReport, SessionError> {
        self.apply_sort_with(ordered_names, |_| {})
    }

    /// [`Session::apply_sort`] with a per-entry progress callback.
    pub fn apply_sort_with(
        &mut self,
        ordered_names: &[String],
        on_entry: impl FnMut(&RenamePlanEntry),
    ) -> Result<SequenceReport, SessionError> {
        let dir = self.require_open()?;
        let reserved = self.reservations.active(&self.last_path);

        let plan = self
            .sequencer
            .plan_sequence(&dir, ordered_names, &reserved)?;
        let report = self.sequencer.apply_plan(&dir, &plan, on_entry);

        self.refresh_after_mutation();
        Ok(report)
    }

    /// Strips sequence prefixes from all non-reserved folders.
    pub fn clear_prefixes(&mut self) -> Result<SequenceReport, SessionError> {
        let dir = self.require_open()?;
        let reserved = self.reservations.active(&self.last_path);
        let report = self.sequencer.clear_prefixes(&dir, &reserved)?;
        self.refresh_after_mutation();
        Ok(report)
    }

    /// Marks folders as reserved. Names not present in the current
    /// listing are ignored, preserving the subset invariant.
    pub fn mark_reserved(&mut self, names: &[String]) -> Result<(), SessionError> {
        self.require_open()?;
        let present: Vec<String> = names
            .iter()
            .filter(|n| self.last_listing.contains(n))
            .cloned()
            .collect();
        if self.reservations.mark(&self.last_path, &present) {
            self.persist();
        }
        Ok(())
    }

    /// Removes folders from the reserved set.
    pub fn unmark_reserved(&mut self, names: &[String]) -> Result<(), SessionError> {
        self.require_open()?;
        if self.reservations.unmark(&self.last_path, names) {
            self.persist();
        }
        Ok(())
    }

    /// Creates a new subfolder, probing for a free name.
    pub fn create_folder(&mut self, name: &str) -> Result<String, SessionError> {
        let dir = self.require_open()?;
        let created = folder_ops::create_folder(&dir, name)?;
        self.refresh_after_mutation();
        Ok(created)
    }

    /// Renames a single folder at the user's request, transferring its
    /// reservation in the same logical operation.
    pub fn rename_folder(&mut self, old: &str, new: &str) -> Result<(), SessionError> {
        let dir = self.require_open()?;
        folder_ops::rename_folder(&dir, old, new)?;
        if self.reservations.transfer(&self.last_path, old, new) {
            self.persist();
        }
        self.refresh_after_mutation();
        Ok(())
    }

    /// Deletes folders, best-effort; reservations of removed folders are
    /// pruned by the reconciliation that follows.
    pub fn delete_folders(&mut self, names: &[String]) -> Result<DeleteReport, SessionError> {
        let dir = self.require_open()?;
        let report = folder_ops::delete_folders(&dir, names);
        self.refresh_after_mutation();
        Ok(report)
    }

    /// Drains watcher notifications and refreshes if one was pending.
    ///
    /// The pending change is discarded when it was observed on a path that
    /// is no longer the open directory (stale notification after the user
    /// navigated away). Returns true if a refresh actually changed the
    /// listing.
    pub fn pump_watcher(&mut self) -> bool {
        let Some(changed_path) = self.watcher.poll_change() else {
            return false;
        };
        if Some(changed_path.as_path()) != self.open_dir.as_deref() {
            return false;
        }
        self.refresh()
    }

    /// Re-lists the open directory.
    ///
    /// Short-circuits when the fresh listing equals the last known one, so
    /// redundant notifications cause no reconciliation or persistence
    /// churn. Returns true if the listing changed.
    pub fn refresh(&mut self) -> bool {
        let Some(dir) = self.open_dir.clone() else {
            return false;
        };
        let listing = match list_folders(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                eprintln!("Warning: {}", e);
                return false;
            }
        };
        if listing == self.last_listing {
            return false;
        }
        self.last_listing = listing;
        if self
            .reservations
            .reconcile(&self.last_path, &self.last_listing)
        {
            self.persist();
        }
        true
    }

    // ------------------------------------------------------------- notes

    /// Adds a note; content is trimmed and empty submissions rejected.
    pub fn add_note(&mut self, content: &str, category: NoteCategory) -> Result<(), SessionError> {
        self.notes.add(content, category)?;
        self.persist();
        Ok(())
    }

    pub fn toggle_note(&mut self, index: usize) -> Result<(), SessionError> {
        self.notes.toggle_completed(index)?;
        self.persist();
        Ok(())
    }

    pub fn set_note_category(
        &mut self,
        index: usize,
        category: NoteCategory,
    ) -> Result<(), SessionError> {
        self.notes.set_category(index, category)?;
        self.persist();
        Ok(())
    }

    pub fn toggle_note_pin(&mut self, index: usize) -> Result<(), SessionError> {
        self.notes.toggle_pin(index)?;
        self.persist();
        Ok(())
    }

    pub fn delete_note(&mut self, index: usize) -> Result<Note, SessionError> {
        let removed = self.notes.delete(index)?;
        self.persist();
        Ok(removed)
    }

    pub fn notes(&self) -> &[Note] {
        self.notes.notes()
    }

    /// Storage indices of the notes in display order.
    pub fn notes_render_order(&self) -> Vec<usize> {
        self.notes.render_order()
    }

    // ---------------------------------------------------------- ui prefs

    /// Reads a UI preference; the core never interprets these.
    pub fn ui_pref(&self, key: &str) -> Option<&Value> {
        self.ui_prefs.get(key)
    }

    /// Stores a UI preference and persists.
    pub fn set_ui_pref(&mut self, key: &str, value: Value) {
        if let Some(object) = self.ui_prefs.as_object_mut() {
            object.insert(key.to_string(), value);
            self.persist();
        }
    }

    // ------------------------------------------------------------ internal

    fn require_open(&self) -> Result<PathBuf, SessionError> {
        self.open_dir.clone().ok_or(SessionError::NoOpenDirectory)
    }

    fn refresh_after_mutation(&mut self) {
        let Some(dir) = self.open_dir.clone() else {
            return;
        };
        match list_folders(&dir) {
            Ok(listing) => self.last_listing = listing,
            Err(e) => {
                eprintln!("Warning: {}", e);
                self.last_listing.clear();
            }
        }
        if self
            .reservations
            .reconcile(&self.last_path, &self.last_listing)
        {
            self.persist();
        }
    }

    /// Writes the full state document. A failed write is reported and
    /// swallowed; the in-memory state remains authoritative until the
    /// next successful write.
    fn persist(&self) {
        let state = PersistedState {
            last_path: self.last_path.clone(),
            reserved: self.reservations.map().clone(),
            notes: self.notes.notes().to_vec(),
            ui_prefs: self.ui_prefs.clone(),
        };
        if let Err(e) = state.save(&self.state_path) {
            eprintln!("Warning: {}", e);
        }
    }
}
