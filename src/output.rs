//! Output formatting and styling module.
//!
//! Centralizes all CLI output: colored status lines, progress tracking
//! for rename batches, and report summaries. Keeping this in one place
//! makes it easy to change formatting globally.

use crate::sequencer::{FolderEntry, SequenceReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Creates a progress bar sized for a rename batch.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a directory listing with reservation markers.
    pub fn listing(entries: &[FolderEntry]) {
        for entry in entries {
            if entry.reserved {
                println!("  {} {}", "◆".yellow(), entry.name.bold());
            } else {
                println!("  {} {}", "·".dimmed(), entry.name);
            }
        }
        if entries.is_empty() {
            println!("  {}", "(no subfolders)".dimmed());
        }
    }

    /// Prints the outcome of a rename batch.
    pub fn sequence_summary(report: &SequenceReport) {
        for entry in &report.renamed {
            Self::success(&format!("{} → {}", entry.old_name, entry.new_name));
        }
        for name in &report.skipped {
            Self::plain(&format!("  {} vanished, skipped", name));
        }
        for (name, reason) in &report.warnings {
            Self::warning(&format!("{} is busy: {}", name, reason));
        }
        for (name, reason) in &report.failures {
            Self::error(&format!("{}: {}", name, reason));
        }

        let summary = format!(
            "{} renamed, {} unchanged, {} skipped, {} warnings, {} failures",
            report.renamed.len(),
            report.unchanged,
            report.skipped.len(),
            report.warnings.len(),
            report.failures.len()
        );
        if report.is_clean() {
            Self::success(&summary);
        } else {
            Self::warning(&summary);
        }
    }
}
