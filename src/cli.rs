//! Command-line interface module for dirseq.
//!
//! The binary is strictly a caller of [`crate::session::Session`]: it
//! parses arguments, opens the requested directory, invokes one engine
//! operation and formats the resulting report. All sequencing decisions
//! live in the engine.

use crate::notes::NoteCategory;
use crate::output::OutputFormatter;
use crate::session::Session;
use crate::state::default_state_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Renumber drag-ordered folder lists with zero-padded sequence prefixes.
#[derive(Parser)]
#[command(name = "dirseq", version, about)]
pub struct Cli {
    /// Path of the state file (defaults to ~/.config/dirseq/state.json).
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the subfolders of a directory with reservation markers.
    List {
        /// Directory to list; defaults to the last opened one.
        dir: Option<PathBuf>,
    },
    /// Apply sequence prefixes in the given order.
    Sort {
        dir: PathBuf,
        /// Folder names in the desired order, one per existing subfolder.
        #[arg(required = true)]
        order: Vec<String>,
    },
    /// Strip sequence prefixes from all non-reserved subfolders.
    Clear { dir: PathBuf },
    /// Exclude folders from sequencing.
    Reserve {
        dir: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Re-include folders in sequencing.
    Unreserve {
        dir: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Create a new subfolder, probing for a free name.
    New { dir: PathBuf, name: String },
    /// Rename a single subfolder.
    Rename {
        dir: PathBuf,
        old: String,
        new: String,
    },
    /// Delete subfolders recursively, best-effort.
    Delete {
        dir: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Manage the notes list.
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Watch a directory and report external changes as they happen.
    Watch { dir: PathBuf },
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note.
    Add {
        content: String,
        /// Mark the note as a to-do instead of an idea.
        #[arg(long)]
        todo: bool,
    },
    /// List notes in display order.
    List,
    /// Toggle the completed flag of a note.
    Done { index: usize },
    /// Toggle the pinned flag of a note.
    Pin { index: usize },
    /// Switch a note between idea and todo.
    Category {
        index: usize,
        #[arg(value_parser = ["idea", "todo"])]
        category: String,
    },
    /// Delete a note.
    Rm { index: usize },
}

/// Runs the CLI application with already-parsed arguments.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let state_path = cli.state.unwrap_or_else(default_state_path);
    let mut session = Session::load(state_path);

    match cli.command {
        Command::List { dir } => {
            let entries = match dir {
                Some(dir) => session.open(&dir),
                None => session.open_last(),
            }
            .map_err(|e| e.to_string())?;
            OutputFormatter::info(&format!("Contents of {}:", session.last_path()));
            OutputFormatter::listing(&entries);
        }
        Command::Sort { dir, order } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            let pb = OutputFormatter::create_progress_bar(order.len() as u64);
            let report = session
                .apply_sort_with(&order, |_| pb.inc(1))
                .map_err(|e| e.to_string())?;
            pb.finish_and_clear();
            OutputFormatter::sequence_summary(&report);
        }
        Command::Clear { dir } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            let report = session.clear_prefixes().map_err(|e| e.to_string())?;
            OutputFormatter::sequence_summary(&report);
        }
        Command::Reserve { dir, names } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            session.mark_reserved(&names).map_err(|e| e.to_string())?;
            OutputFormatter::listing(&session.entries());
        }
        Command::Unreserve { dir, names } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            session.unmark_reserved(&names).map_err(|e| e.to_string())?;
            OutputFormatter::listing(&session.entries());
        }
        Command::New { dir, name } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            let created = session.create_folder(&name).map_err(|e| e.to_string())?;
            OutputFormatter::success(&format!("Created {}", created));
        }
        Command::Rename { dir, old, new } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            session.rename_folder(&old, &new).map_err(|e| e.to_string())?;
            OutputFormatter::success(&format!("{} → {}", old, new));
        }
        Command::Delete { dir, names } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            let report = session.delete_folders(&names).map_err(|e| e.to_string())?;
            for name in &report.deleted {
                OutputFormatter::success(&format!("Deleted {}", name));
            }
            for (name, reason) in &report.failures {
                OutputFormatter::error(&format!("Failed to delete {}: {}", name, reason));
            }
        }
        Command::Note { action } => run_note_action(&mut session, action)?,
        Command::Watch { dir } => {
            session.open(&dir).map_err(|e| e.to_string())?;
            OutputFormatter::info(&format!(
                "Watching {} (Ctrl-C to stop)",
                session.last_path()
            ));
            loop {
                if session.pump_watcher() {
                    OutputFormatter::plain("Directory changed:");
                    OutputFormatter::listing(&session.entries());
                }
                std::thread::sleep(Duration::from_millis(500));
            }
        }
    }

    Ok(())
}

fn run_note_action(session: &mut Session, action: NoteAction) -> Result<(), String> {
    match action {
        NoteAction::Add { content, todo } => {
            let category = if todo {
                NoteCategory::Todo
            } else {
                NoteCategory::Idea
            };
            session
                .add_note(&content, category)
                .map_err(|e| e.to_string())?;
            OutputFormatter::success("Note added");
        }
        NoteAction::List => {
            let notes = session.notes();
            for index in session.notes_render_order() {
                let note = &notes[index];
                let check = if note.completed { "[x]" } else { "[ ]" };
                let pin = if note.pinned { "📌 " } else { "" };
                OutputFormatter::plain(&format!(
                    "{:>3}  {} {}{} ({} · {})",
                    index,
                    check,
                    pin,
                    note.content,
                    note.category.label(),
                    note.timestamp
                ));
            }
            if notes.is_empty() {
                OutputFormatter::plain("(no notes)");
            }
        }
        NoteAction::Done { index } => {
            session.toggle_note(index).map_err(|e| e.to_string())?;
            OutputFormatter::success("Toggled");
        }
        NoteAction::Pin { index } => {
            session.toggle_note_pin(index).map_err(|e| e.to_string())?;
            OutputFormatter::success("Toggled pin");
        }
        NoteAction::Category { index, category } => {
            let category = if category == "todo" {
                NoteCategory::Todo
            } else {
                NoteCategory::Idea
            };
            session
                .set_note_category(index, category)
                .map_err(|e| e.to_string())?;
            OutputFormatter::success("Category updated");
        }
        NoteAction::Rm { index } => {
            let removed = session.delete_note(index).map_err(|e| e.to_string())?;
            OutputFormatter::success(&format!("Deleted: {}", removed.content));
        }
    }
    Ok(())
}
