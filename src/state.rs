/// Durable session state: last-used path, reservations, notes, UI prefs.
///
/// The backing store is a single JSON document. It is user-editable text,
/// so loading is defensive throughout: a missing file, malformed JSON or
/// a wrong-typed field never fails the load — each field falls back to
/// its empty default instead. Saving overwrites the whole document; a
/// failed write is reported but the in-memory state stays authoritative
/// for the rest of the session.
use crate::notes::{Note, NoteCategory, current_timestamp};
use crate::reservations::ReservationMap;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// In-memory image of the persisted state document.
#[derive(Debug, Default)]
pub struct PersistedState {
    /// Last directory the user had open.
    pub last_path: String,
    /// Absolute directory path to reserved folder names.
    pub reserved: ReservationMap,
    /// Notes in storage order.
    pub notes: Vec<Note>,
    /// UI preferences, opaque to the core. Always a JSON object.
    pub ui_prefs: Value,
}

/// Errors that can occur while writing the state document.
#[derive(Debug)]
pub enum StateError {
    /// Failed to serialize or write the state file.
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteFailed { path, source } => {
                write!(f, "Failed to write state file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Default location of the state document.
///
/// `~/.config/dirseq/state.json`, falling back to `dirseq_state.json` in
/// the working directory when HOME is unset.
pub fn default_state_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("dirseq")
            .join("state.json")
    } else {
        PathBuf::from("dirseq_state.json")
    }
}

impl PersistedState {
    /// Loads state from `path`, tolerating every malformed shape.
    ///
    /// * missing file: empty defaults
    /// * unreadable file or malformed JSON: empty defaults
    /// * wrong field types: per-field defaults
    /// * legacy notes stored as bare strings: upgraded to full records
    ///   with a generated timestamp and the idea category
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::empty();
        };
        let Ok(doc) = serde_json::from_str::<Value>(&content) else {
            return Self::empty();
        };
        Self::from_document(&doc)
    }

    fn empty() -> Self {
        Self {
            ui_prefs: json!({}),
            ..Default::default()
        }
    }

    fn from_document(doc: &Value) -> Self {
        let last_path = doc["last_path"].as_str().unwrap_or_default().to_string();
        let reserved = Self::reserved_from_value(&doc["reserved"]);
        let notes = Self::notes_from_value(&doc["notes"]);
        let ui_prefs = match doc.get("ui_prefs") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => json!({}),
        };

        Self {
            last_path,
            reserved,
            notes,
            ui_prefs,
        }
    }

    fn reserved_from_value(value: &Value) -> ReservationMap {
        let Some(object) = value.as_object() else {
            return ReservationMap::new();
        };
        let mut map = ReservationMap::new();
        for (dir, names) in object {
            let Some(array) = names.as_array() else {
                continue;
            };
            let set: BTreeSet<String> = array
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect();
            if !set.is_empty() {
                map.insert(dir.clone(), set);
            }
        }
        map
    }

    fn notes_from_value(value: &Value) -> Vec<Note> {
        let Some(array) = value.as_array() else {
            return Vec::new();
        };
        array.iter().filter_map(Self::note_from_value).collect()
    }

    fn note_from_value(value: &Value) -> Option<Note> {
        // Legacy representation: the note is a bare string.
        if let Some(content) = value.as_str() {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return None;
            }
            return Some(Note::from_legacy(trimmed.to_string()));
        }

        let object = value.as_object()?;
        let content = object.get("content")?.as_str()?.trim();
        if content.is_empty() {
            return None;
        }
        let timestamp = object
            .get("timestamp")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(current_timestamp);
        let category = match object.get("category").and_then(|v| v.as_str()) {
            Some("todo") => NoteCategory::Todo,
            _ => NoteCategory::Idea,
        };
        let completed = object
            .get("completed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let pinned = object
            .get("pinned")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Some(Note {
            content: content.to_string(),
            timestamp,
            category,
            completed,
            pinned,
        })
    }

    /// Serializes the full state and overwrites the backing store.
    ///
    /// The parent directory is created if needed.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let reserved: Map<String, Value> = self
            .reserved
            .iter()
            .map(|(dir, names)| {
                (
                    dir.clone(),
                    Value::Array(names.iter().map(|n| json!(n)).collect()),
                )
            })
            .collect();

        let doc = json!({
            "last_path": self.last_path,
            "reserved": reserved,
            "notes": self.notes,
            "ui_prefs": self.ui_prefs,
        });

        let content =
            serde_json::to_string_pretty(&doc).map_err(|e| StateError::WriteFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StateError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, content).map_err(|e| StateError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
