//! dirseq - sequenced folder organization
//!
//! This library renumbers a user-ordered list of subdirectories with
//! zero-padded `NN_` prefixes, keeps reserved folders out of the
//! sequence, persists reservations and a notes list across runs, and
//! reconciles its view of a directory against external filesystem
//! changes.

pub mod cli;
pub mod folder_ops;
pub mod notes;
pub mod output;
pub mod reservations;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod watcher;

pub use folder_ops::{DeleteReport, FolderOpError};
pub use notes::{Note, NoteCategory, NotesStore};
pub use reservations::{ReservationMap, ReservationStore};
pub use sequencer::{
    FolderEntry, RenamePlanEntry, SequenceError, SequenceReport, Sequencer, list_folders,
};
pub use session::{Session, SessionError};
pub use state::{PersistedState, StateError, default_state_path};
pub use watcher::DirectoryWatcher;

pub use cli::{Cli, run_cli};
