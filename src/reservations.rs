/// Reservation bookkeeping for folders excluded from sequencing.
///
/// Reservations are keyed by absolute directory path, so each directory a
/// user has visited keeps its own reserved-name set. The set for the open
/// directory is reconciled against the real listing on every refresh:
/// names whose folders were deleted externally are pruned, keeping the
/// invariant that the active set is always a subset of what is on disk.
use std::collections::{BTreeSet, HashMap};

/// Persisted mapping of absolute directory path to reserved folder names.
pub type ReservationMap = HashMap<String, BTreeSet<String>>;

/// Maintains reserved-name sets across directories.
#[derive(Debug, Default)]
pub struct ReservationStore {
    map: ReservationMap,
}

impl ReservationStore {
    /// Wraps an already-loaded reservation map.
    pub fn from_map(map: ReservationMap) -> Self {
        Self { map }
    }

    /// Borrows the full map for persistence.
    pub fn map(&self) -> &ReservationMap {
        &self.map
    }

    /// Returns the reserved set for a directory, cloned; empty if none.
    pub fn active(&self, dir: &str) -> BTreeSet<String> {
        self.map.get(dir).cloned().unwrap_or_default()
    }

    /// Returns true if `name` is reserved within `dir`.
    pub fn is_reserved(&self, dir: &str, name: &str) -> bool {
        self.map.get(dir).is_some_and(|set| set.contains(name))
    }

    /// Intersects the stored set for `dir` with the names actually on disk.
    ///
    /// Returns true if pruning changed the set, in which case the caller
    /// must re-persist immediately (self-healing against externally
    /// deleted folders). An emptied set is dropped from the map entirely.
    pub fn reconcile(&mut self, dir: &str, on_disk: &[String]) -> bool {
        let Some(stored) = self.map.get(dir) else {
            return false;
        };
        let pruned: BTreeSet<String> = stored
            .iter()
            .filter(|name| on_disk.iter().any(|d| d == *name))
            .cloned()
            .collect();
        if pruned.len() == stored.len() {
            return false;
        }
        if pruned.is_empty() {
            self.map.remove(dir);
        } else {
            self.map.insert(dir.to_string(), pruned);
        }
        true
    }

    /// Adds names to the reserved set for `dir`. Returns true on change.
    pub fn mark(&mut self, dir: &str, names: &[String]) -> bool {
        let set = self.map.entry(dir.to_string()).or_default();
        let mut changed = false;
        for name in names {
            changed |= set.insert(name.clone());
        }
        changed
    }

    /// Removes names from the reserved set for `dir`. Returns true on change.
    pub fn unmark(&mut self, dir: &str, names: &[String]) -> bool {
        let Some(set) = self.map.get_mut(dir) else {
            return false;
        };
        let mut changed = false;
        for name in names {
            changed |= set.remove(name);
        }
        if set.is_empty() {
            self.map.remove(dir);
        }
        changed
    }

    /// Transfers a reservation from `old` to `new` after a rename.
    ///
    /// Must be called as part of the same logical operation that renamed
    /// the folder on disk, so a reservation never silently drops on a
    /// successful rename. Returns true if `old` was reserved.
    pub fn transfer(&mut self, dir: &str, old: &str, new: &str) -> bool {
        let Some(set) = self.map.get_mut(dir) else {
            return false;
        };
        if set.remove(old) {
            set.insert(new.to_string());
            true
        } else {
            false
        }
    }
}
