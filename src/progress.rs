//! Progress state for an organize run.
//!
//! The organizer updates a [`Progress`] once per file and publishes it as a
//! [`ProgressEvent`]. Anything rendering progress (a terminal bar, a test
//! assertion) only ever sees the latest values.

use crate::file_category::SkipReason;
use crate::file_organizer::Operation;
use std::collections::HashMap;
use std::path::PathBuf;

/// Message shown once a run has handled every file.
pub const SUCCESS_MESSAGE: &str = "Files have been organized successfully!";

/// Counters for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Files handled so far, moved or not.
    pub processed: usize,
    /// Files that were moved into a year/month folder.
    pub moved: usize,
    /// Files found in the source directory at the start of the run.
    pub total: usize,
}

impl Progress {
    /// Creates a fresh progress state for `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            moved: 0,
            total,
        }
    }

    /// Records a file that was left where it was.
    pub fn record_skipped(&mut self) {
        self.processed += 1;
    }

    /// Records a file that was moved.
    pub fn record_moved(&mut self) {
        self.processed += 1;
        self.moved += 1;
    }

    /// Files not yet processed.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    /// Completion percentage, rounded down.
    ///
    /// An empty run reports 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediasort::progress::Progress;
    ///
    /// let progress = Progress { processed: 1, moved: 1, total: 3 };
    /// assert_eq!(progress.percentage(), 33);
    /// ```
    pub fn percentage(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.processed as u64 * 100) / self.total as u64
    }

    /// Short status line, e.g. `Processed 3 of 10 files`.
    pub fn summary_message(&self) -> String {
        format!("Processed {} of {} files", self.processed, self.total)
    }

    /// Detailed status line with moved, remaining and total counts.
    pub fn detail_message(&self) -> String {
        format!(
            "Files moved: {} | Files left: {} | Total files: {}",
            self.moved,
            self.remaining(),
            self.total
        )
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Moved(Operation),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Final result of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub progress: Progress,
    /// Every move performed, in order.
    pub operations: Vec<Operation>,
    /// Number of skipped files per reason.
    pub skipped: HashMap<SkipReason, usize>,
}

impl RunSummary {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            progress: Progress::new(total),
            ..Self::default()
        }
    }

    /// Applies a file outcome to the counters and the operation list.
    pub(crate) fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Moved(operation) => {
                self.progress.record_moved();
                self.operations.push(operation.clone());
            }
            FileOutcome::Skipped { reason, .. } => {
                self.progress.record_skipped();
                *self.skipped.entry(*reason).or_insert(0) += 1;
            }
        }
    }

    /// Total skipped files, across all reasons.
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Events emitted by the organizer while it runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The source directory was scanned.
    Started { total: usize },
    /// One more file was handled.
    FileProcessed {
        progress: Progress,
        outcome: FileOutcome,
    },
    /// Every file was handled.
    Finished(RunSummary),
}
