//! Output formatting and styling module.
//!
//! All operator-facing text goes through [`OutputFormatter`]: colored status
//! lines, the run progress bar and the end-of-run summary table.

use crate::progress::{Progress, RunSummary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// OutputFormatter::success("Files have been organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for an organize run.
    ///
    /// The bar counts percent, not files: its length is 100 and its position
    /// is set from [`Progress::percentage`] by [`Self::show_progress`]. A
    /// hidden bar is returned when `visible` is false.
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// use mediasort::progress::Progress;
    /// let pb = OutputFormatter::create_progress_bar(true);
    /// OutputFormatter::show_progress(&pb, &Progress { processed: 1, moved: 1, total: 4 });
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar(visible: bool) -> ProgressBar {
        if !visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Moves the bar to the run's completion percentage and shows the
    /// summary message next to it.
    pub fn show_progress(pb: &ProgressBar, progress: &Progress) {
        pb.set_length(100);
        pb.set_position(progress.percentage());
        pb.set_message(progress.summary_message());
    }

    /// Prints moved/skipped counts for a finished run.
    pub fn summary_table(summary: &RunSummary) {
        Self::header("SUMMARY");

        let mut rows: Vec<(String, usize)> = Vec::new();
        rows.push(("Moved".to_string(), summary.progress.moved));

        let mut skipped: Vec<_> = summary
            .skipped
            .iter()
            .map(|(reason, count)| (format!("Skipped ({})", reason.describe()), *count))
            .collect();
        skipped.sort();
        rows.extend(skipped);

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max("Left in place".len());

        for (label, count) in &rows {
            let file_word = if *count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                label,
                count.to_string().green(),
                file_word,
                width = width
            );
        }

        let left = summary.skipped_total();
        println!(
            "{:<width$} | {} {}",
            "Left in place",
            left.to_string().yellow(),
            if left == 1 { "file" } else { "files" },
            width = width
        );

        println!("{}", "-".repeat(width + 10));
        let total = summary.progress.total;
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );
    }
}
