/// Ordered collection of timestamped, categorized note records.
///
/// Notes are identified positionally: every mutating operation takes an
/// index into the store's insertion order. `render_order` computes the
/// display ordering without reordering the underlying storage, so indices
/// stay stable across toggles.
use chrono::Local;
use serde::{Deserialize, Serialize};

/// The kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    /// A free-form idea.
    Idea,
    /// An actionable to-do item.
    Todo,
}

impl NoteCategory {
    /// Returns the label used in the persisted state document.
    pub fn label(&self) -> &'static str {
        match self {
            NoteCategory::Idea => "idea",
            NoteCategory::Todo => "todo",
        }
    }
}

/// A single note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Trimmed, non-empty text.
    pub content: String,
    /// Local creation time, `YYYY-MM-DD HH:MM`.
    pub timestamp: String,
    /// Note kind.
    pub category: NoteCategory,
    /// Whether the note has been checked off.
    pub completed: bool,
    /// Pinned notes sort before unpinned ones within their group.
    #[serde(default)]
    pub pinned: bool,
}

impl Note {
    /// Creates a fresh note with the current local timestamp.
    pub fn new(content: String, category: NoteCategory) -> Self {
        Self {
            content,
            timestamp: current_timestamp(),
            category,
            completed: false,
            pinned: false,
        }
    }

    /// Upgrades a legacy bare-string note into a full record.
    ///
    /// Older state files stored notes as plain strings; those get a
    /// generated timestamp and default to the idea category.
    pub fn from_legacy(content: String) -> Self {
        Self::new(content, NoteCategory::Idea)
    }
}

/// Formats the current local time the way note timestamps are stored.
pub fn current_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Errors that can occur when mutating the notes list.
#[derive(Debug, PartialEq, Eq)]
pub enum NoteError {
    /// The submitted content was empty after trimming.
    EmptyContent,
    /// The given index does not name a note.
    InvalidIndex(usize),
}

impl std::fmt::Display for NoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteError::EmptyContent => write!(f, "Note content is empty"),
            NoteError::InvalidIndex(idx) => write!(f, "No note at index {}", idx),
        }
    }
}

impl std::error::Error for NoteError {}

/// The notes list with its mutation and ordering rules.
#[derive(Debug, Default)]
pub struct NotesStore {
    notes: Vec<Note>,
}

impl NotesStore {
    /// Wraps an already-loaded notes list.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Borrows the notes in storage order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Consumes the store, yielding the notes in storage order.
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Adds a note at the front of the list.
    ///
    /// Content is trimmed first; empty submissions are rejected.
    pub fn add(&mut self, content: &str, category: NoteCategory) -> Result<(), NoteError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(NoteError::EmptyContent);
        }
        self.notes.insert(0, Note::new(trimmed.to_string(), category));
        Ok(())
    }

    /// Flips the completed flag of the note at `index`.
    pub fn toggle_completed(&mut self, index: usize) -> Result<(), NoteError> {
        let note = self.get_mut(index)?;
        note.completed = !note.completed;
        Ok(())
    }

    /// Changes the category of the note at `index`.
    pub fn set_category(&mut self, index: usize, category: NoteCategory) -> Result<(), NoteError> {
        self.get_mut(index)?.category = category;
        Ok(())
    }

    /// Flips the pinned flag of the note at `index`.
    pub fn toggle_pin(&mut self, index: usize) -> Result<(), NoteError> {
        let note = self.get_mut(index)?;
        note.pinned = !note.pinned;
        Ok(())
    }

    /// Removes and returns the note at `index`.
    pub fn delete(&mut self, index: usize) -> Result<Note, NoteError> {
        if index >= self.notes.len() {
            return Err(NoteError::InvalidIndex(index));
        }
        Ok(self.notes.remove(index))
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Note, NoteError> {
        self.notes.get_mut(index).ok_or(NoteError::InvalidIndex(index))
    }

    /// Returns storage indices in display order.
    ///
    /// Active notes come before completed ones; within each group pinned
    /// notes come first, then newest timestamp first. The sort is stable,
    /// so equal keys keep their storage order.
    pub fn render_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.notes.len()).collect();
        order.sort_by(|&a, &b| {
            let na = &self.notes[a];
            let nb = &self.notes[b];
            na.completed
                .cmp(&nb.completed)
                .then(nb.pinned.cmp(&na.pinned))
                .then(nb.timestamp.cmp(&na.timestamp))
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str, timestamp: &str, completed: bool, pinned: bool) -> Note {
        Note {
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            category: NoteCategory::Idea,
            completed,
            pinned,
        }
    }

    #[test]
    fn test_add_trims_and_rejects_empty() {
        let mut store = NotesStore::default();
        assert_eq!(store.add("   ", NoteCategory::Idea), Err(NoteError::EmptyContent));
        store.add("  buy paint  ", NoteCategory::Todo).expect("Add failed");

        assert_eq!(store.notes()[0].content, "buy paint");
        assert_eq!(store.notes()[0].category, NoteCategory::Todo);
        assert!(!store.notes()[0].completed);
        assert!(!store.notes()[0].pinned);
        assert!(!store.notes()[0].timestamp.is_empty());
    }

    #[test]
    fn test_add_inserts_at_front() {
        let mut store = NotesStore::default();
        store.add("first", NoteCategory::Idea).expect("Add failed");
        store.add("second", NoteCategory::Idea).expect("Add failed");

        assert_eq!(store.notes()[0].content, "second");
        assert_eq!(store.notes()[1].content, "first");
    }

    #[test]
    fn test_toggle_and_delete_by_index() {
        let mut store = NotesStore::default();
        store.add("task", NoteCategory::Todo).expect("Add failed");

        store.toggle_completed(0).expect("Toggle failed");
        assert!(store.notes()[0].completed);
        store.toggle_pin(0).expect("Pin failed");
        assert!(store.notes()[0].pinned);
        store.set_category(0, NoteCategory::Idea).expect("Category failed");
        assert_eq!(store.notes()[0].category, NoteCategory::Idea);

        let removed = store.delete(0).expect("Delete failed");
        assert_eq!(removed.content, "task");
        assert!(store.is_empty());
        assert_eq!(store.delete(0), Err(NoteError::InvalidIndex(0)));
    }

    #[test]
    fn test_render_order_groups_and_sorts() {
        let store = NotesStore::from_notes(vec![
            note("done old", "2024-01-01 09:00", true, false),
            note("active old", "2024-01-02 09:00", false, false),
            note("active pinned", "2024-01-01 08:00", false, true),
            note("active new", "2024-01-03 09:00", false, false),
            note("done pinned", "2024-01-05 09:00", true, true),
        ]);

        let order = store.render_order();
        let contents: Vec<&str> = order.iter().map(|&i| store.notes()[i].content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "active pinned",
                "active new",
                "active old",
                "done pinned",
                "done old",
            ]
        );
    }

    #[test]
    fn test_legacy_upgrade_defaults() {
        let upgraded = Note::from_legacy("old note".to_string());
        assert_eq!(upgraded.content, "old note");
        assert_eq!(upgraded.category, NoteCategory::Idea);
        assert!(!upgraded.completed);
        assert!(!upgraded.timestamp.is_empty());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = current_timestamp();
        // YYYY-MM-DD HH:MM
        assert_eq!(ts.len(), 16);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }
}
