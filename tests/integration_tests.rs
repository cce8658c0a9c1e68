/// Integration tests for dirseq
///
/// These tests simulate real-world usage scenarios, exercising the
/// end-to-end flow: open a directory, reorder it, sequence it, and keep
/// reservations and notes in sync with the filesystem and the persisted
/// state file.
///
/// Test categories:
/// 1. Sequencing scenarios from user-visible orderings
/// 2. Idempotence of sequencing and prefix clearing
/// 3. Collision safety
/// 4. Reservation round-trips and pruning
/// 5. State file compatibility (legacy note upgrade)
/// 6. Watcher-driven reconciliation
use dirseq::notes::NoteCategory;
use dirseq::sequencer::list_folders;
use dirseq::session::Session;
use dirseq::state::PersistedState;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary base directory with
/// subfolders and an isolated state file.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new fixture with an empty base directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("base")).expect("Failed to create base");
        TestFixture { temp_dir }
    }

    /// Create a fixture whose base directory contains the given folders.
    fn with_folders(names: &[&str]) -> Self {
        let fixture = Self::new();
        for name in names {
            fixture.create_folder(name);
        }
        fixture
    }

    /// The directory the session operates on.
    fn base(&self) -> PathBuf {
        self.temp_dir.path().join("base")
    }

    /// Path of the isolated state file.
    fn state_path(&self) -> PathBuf {
        self.temp_dir.path().join("state.json")
    }

    /// A session bound to this fixture's state file.
    fn session(&self) -> Session {
        Session::load(self.state_path())
    }

    /// A session with the base directory already open.
    fn open_session(&self) -> Session {
        let mut session = self.session();
        session.open(&self.base()).expect("Open failed");
        session
    }

    fn create_folder(&self, name: &str) {
        fs::create_dir(self.base().join(name)).expect("Failed to create folder");
    }

    fn remove_folder(&self, name: &str) {
        fs::remove_dir_all(self.base().join(name)).expect("Failed to remove folder");
    }

    /// The sorted folder names currently on disk.
    fn listing(&self) -> Vec<String> {
        list_folders(&self.base()).expect("Listing failed")
    }

    fn write_state(&self, content: &str) {
        fs::write(self.state_path(), content).expect("Failed to write state file");
    }

    fn assert_folder_exists(&self, name: &str) {
        let path = self.base().join(name);
        assert!(path.is_dir(), "Folder should exist: {}", path.display());
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Test Suite 1: Sequencing Scenarios
// ============================================================================

#[test]
fn test_scenario_reassigns_existing_prefix() {
    // Directory ["Logo", "03_Draft", "Final"], order ["Final", "Logo",
    // "03_Draft"]: the third entry's prefix is stripped then reassigned.
    let fixture = TestFixture::with_folders(&["Logo", "03_Draft", "Final"]);
    let mut session = fixture.open_session();

    let report = session
        .apply_sort(&owned(&["Final", "Logo", "03_Draft"]))
        .expect("Sort failed");

    assert!(report.is_clean());
    assert_eq!(fixture.listing(), vec!["01_Final", "02_Logo", "03_Draft"]);
}

#[test]
fn test_scenario_reserved_folder_keeps_name_and_index() {
    let fixture = TestFixture::with_folders(&["Logo", "Draft", "Final"]);
    let mut session = fixture.open_session();
    session.mark_reserved(&owned(&["Logo"])).expect("Mark failed");

    session
        .apply_sort(&owned(&["Logo", "Draft", "Final"]))
        .expect("Sort failed");

    assert_eq!(fixture.listing(), vec!["01_Draft", "02_Final", "Logo"]);
}

#[test]
fn test_sequencing_correctness_with_reservations() {
    let names = ["Art", "02_Build", "Copy", "Deck", "Extra", "Filler"];
    let fixture = TestFixture::with_folders(&names);
    let mut session = fixture.open_session();
    session
        .mark_reserved(&owned(&["Copy", "Extra"]))
        .expect("Mark failed");

    session.apply_sort(&owned(&names)).expect("Sort failed");

    let listing = fixture.listing();
    assert!(listing.contains(&"Copy".to_string()));
    assert!(listing.contains(&"Extra".to_string()));

    let sequenced: Vec<&String> = listing
        .iter()
        .filter(|n| *n != "Copy" && *n != "Extra")
        .collect();
    assert_eq!(sequenced.len(), 4);
    for (i, name) in sequenced.iter().enumerate() {
        assert!(
            name.starts_with(&format!("{:02}_", i + 1)),
            "Prefixes must form a contiguous run, got {}",
            name
        );
    }
}

// ============================================================================
// Test Suite 2: Idempotence
// ============================================================================

#[test]
fn test_sort_twice_is_a_no_op_second_time() {
    let fixture = TestFixture::with_folders(&["Beta", "Alpha", "Gamma"]);
    let mut session = fixture.open_session();

    session
        .apply_sort(&owned(&["Alpha", "Beta", "Gamma"]))
        .expect("First sort failed");
    let after_first = fixture.listing();

    let report = session.apply_sort(&after_first).expect("Second sort failed");
    assert!(report.renamed.is_empty(), "Second pass must not rename");
    assert_eq!(report.unchanged, 3);
    assert_eq!(fixture.listing(), after_first);
}

#[test]
fn test_clear_prefixes_twice_is_stable() {
    let fixture = TestFixture::with_folders(&["01_Logo", "02_Draft", "Final"]);
    let mut session = fixture.open_session();

    session.clear_prefixes().expect("First clear failed");
    let after_first = fixture.listing();
    assert_eq!(after_first, vec!["Draft", "Final", "Logo"]);

    let report = session.clear_prefixes().expect("Second clear failed");
    assert!(report.renamed.is_empty());
    assert_eq!(fixture.listing(), after_first);
}

// ============================================================================
// Test Suite 3: Collision Safety
// ============================================================================

#[test]
fn test_equal_stripped_bases_never_collide() {
    let fixture = TestFixture::with_folders(&["02_Alpha (note)", "Alpha"]);
    let mut session = fixture.open_session();

    let report = session
        .apply_sort(&owned(&["02_Alpha (note)", "Alpha"]))
        .expect("Sort failed");

    assert!(report.is_clean());
    let listing = fixture.listing();
    assert_eq!(listing.len(), 2, "No rename may clobber another folder");
    assert_eq!(listing[0], "01_Alpha (note)");
    assert_eq!(listing[1], "02_Alpha");
}

#[test]
fn test_candidate_avoids_unrelated_on_disk_folder() {
    let fixture = TestFixture::with_folders(&["Beta", "01_Beta"]);
    let mut session = fixture.open_session();
    session.mark_reserved(&owned(&["01_Beta"])).expect("Mark failed");

    session.apply_sort(&owned(&["Beta"])).expect("Sort failed");

    let listing = fixture.listing();
    assert!(listing.contains(&"01_Beta".to_string()));
    assert!(listing.contains(&"01_Beta (1)".to_string()));
}

// ============================================================================
// Test Suite 4: Reservations
// ============================================================================

#[test]
fn test_reservation_survives_restart() {
    let fixture = TestFixture::with_folders(&["Logo", "Draft"]);
    {
        let mut session = fixture.open_session();
        session.mark_reserved(&owned(&["Logo"])).expect("Mark failed");
    }

    let mut session = fixture.session();
    let entries = session.open(&fixture.base()).expect("Open failed");
    let logo = entries.iter().find(|e| e.name == "Logo").expect("Logo missing");
    assert!(logo.reserved);
}

#[test]
fn test_externally_deleted_reservation_is_pruned_and_repersisted() {
    let fixture = TestFixture::with_folders(&["Logo", "Draft"]);
    let mut session = fixture.open_session();
    session.mark_reserved(&owned(&["Logo"])).expect("Mark failed");

    fixture.remove_folder("Logo");
    assert!(session.refresh(), "Refresh must notice the deletion");

    assert!(session.entries().iter().all(|e| !e.reserved));
    let state = PersistedState::load(&fixture.state_path());
    assert!(state.reserved.is_empty(), "Pruned set must be re-persisted");
}

#[test]
fn test_manual_rename_carries_reservation() {
    let fixture = TestFixture::with_folders(&["Logo"]);
    let mut session = fixture.open_session();
    session.mark_reserved(&owned(&["Logo"])).expect("Mark failed");

    session.rename_folder("Logo", "Brand").expect("Rename failed");
    fixture.assert_folder_exists("Brand");

    let state = PersistedState::load(&fixture.state_path());
    let set = state.reserved.values().next().expect("Set missing");
    assert!(set.contains("Brand"));
    assert!(!set.contains("Logo"));
}

// ============================================================================
// Test Suite 5: State File Compatibility
// ============================================================================

#[test]
fn test_legacy_string_notes_upgrade_on_load() {
    let fixture = TestFixture::new();
    fixture.write_state(
        r#"{
            "last_path": "/somewhere",
            "reserved": {"/somewhere": ["Logo"]},
            "notes": ["call the printer", "check margins"]
        }"#,
    );

    let session = fixture.session();
    assert_eq!(session.notes().len(), 2);
    for note in session.notes() {
        assert_eq!(note.category, NoteCategory::Idea);
        assert!(!note.completed);
        assert!(!note.timestamp.is_empty(), "Upgrade must generate a timestamp");
    }
}

#[test]
fn test_state_round_trip_preserves_reservations_and_notes() {
    let fixture = TestFixture::with_folders(&["Logo"]);
    {
        let mut session = fixture.open_session();
        session.mark_reserved(&owned(&["Logo"])).expect("Mark failed");
        session
            .add_note("ship the deck", NoteCategory::Todo)
            .expect("Add failed");
        session.toggle_note_pin(0).expect("Pin failed");
    }

    let session = fixture.session();
    assert_eq!(session.notes().len(), 1);
    assert_eq!(session.notes()[0].content, "ship the deck");
    assert_eq!(session.notes()[0].category, NoteCategory::Todo);
    assert!(session.notes()[0].pinned);

    let state = PersistedState::load(&fixture.state_path());
    let set = state.reserved.values().next().expect("Set missing");
    assert!(set.contains("Logo"));
}

#[test]
fn test_corrupt_state_file_starts_clean() {
    let fixture = TestFixture::with_folders(&["Logo"]);
    fixture.write_state("{{{{ definitely not json");

    let mut session = fixture.session();
    assert!(session.last_path().is_empty());
    assert!(session.notes().is_empty());
    // The engine still works and the next save repairs the file.
    session.open(&fixture.base()).expect("Open failed");
    let state = PersistedState::load(&fixture.state_path());
    assert!(!state.last_path.is_empty());
}

// ============================================================================
// Test Suite 6: Watcher-Driven Reconciliation
// ============================================================================

#[test]
fn test_pump_watcher_picks_up_external_creation() {
    let fixture = TestFixture::with_folders(&["Logo"]);
    let mut session = fixture.open_session();

    fixture.create_folder("Dropped");

    // Notification delivery is asynchronous; pump with a deadline.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut refreshed = false;
    while Instant::now() < deadline {
        if session.pump_watcher() {
            refreshed = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(refreshed, "Watcher must surface the external change");
    let names: Vec<String> = session.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Dropped", "Logo"]);
}

#[test]
fn test_stale_notification_after_navigation_is_discarded() {
    let fixture = TestFixture::with_folders(&["Logo"]);
    let other = TestFixture::with_folders(&["Elsewhere"]);

    let mut session = fixture.open_session();
    // Navigate away; the first directory's notifications are now stale.
    session.open(&other.base()).expect("Open failed");

    fixture.create_folder("Dropped");
    std::thread::sleep(Duration::from_millis(300));

    assert!(!session.pump_watcher(), "Stale change must not refresh");
    let names: Vec<String> = session.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Elsewhere"]);
}

// ============================================================================
// Test Suite 7: Manual Folder Operations
// ============================================================================

#[test]
fn test_create_rename_delete_flow() {
    let fixture = TestFixture::new();
    let mut session = fixture.open_session();

    let created = session.create_folder("Assets").expect("Create failed");
    assert_eq!(created, "Assets");
    let duplicate = session.create_folder("Assets").expect("Create failed");
    assert_eq!(duplicate, "Assets(1)");

    session.rename_folder("Assets(1)", "Archive").expect("Rename failed");
    assert!(session.rename_folder("Archive", "Assets").is_err());

    let report = session
        .delete_folders(&owned(&["Assets", "Archive", "Ghost"]))
        .expect("Delete failed");
    assert!(report.is_clean());
    assert!(fixture.listing().is_empty());
}

#[test]
fn test_sort_is_best_effort_when_a_source_vanishes() {
    let fixture = TestFixture::with_folders(&["Alpha", "Beta"]);
    let mut session = fixture.open_session();

    // Delete Beta after listing but before sorting.
    fixture.remove_folder("Beta");
    let report = session
        .apply_sort(&owned(&["Alpha", "Beta"]))
        .expect("Sort failed");

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.skipped, vec!["Beta".to_string()]);
    assert_eq!(fixture.listing(), vec!["01_Alpha"]);
}

#[test]
fn test_list_folders_ignores_files() {
    let fixture = TestFixture::with_folders(&["Alpha"]);
    fs::write(fixture.base().join("readme.txt"), "hello").expect("Failed to write file");

    assert_eq!(fixture.listing(), vec!["Alpha"]);
}

#[test]
fn test_open_missing_directory_fails() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();
    assert!(session.open(Path::new("/non/existent/path")).is_err());
}
