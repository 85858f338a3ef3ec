//! The organize run: scan the source directory, classify every file, resolve
//! its capture date and move it into its year/month folder.
//!
//! [`Organizer::run`] works serially on the calling thread and reports
//! through a callback. [`spawn_worker`] runs the same loop on one background
//! thread and forwards the events over a channel.

use crate::config::RunConfig;
use crate::file_category::{Category, Classification, FileMapper, SkipReason};
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeResult};
use crate::metadata::MetadataReader;
use crate::progress::{FileOutcome, ProgressEvent, RunSummary};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Where a dry run would put a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub path: PathBuf,
    pub classification: Classification,
    /// Target folder and the timestamp it was derived from, for files that would move.
    pub target: Option<(PathBuf, NaiveDateTime)>,
}

/// Drives a single organize run.
pub struct Organizer<R> {
    config: RunConfig,
    reader: R,
    mapper: FileMapper,
}

impl<R: MetadataReader> Organizer<R> {
    pub fn new(config: RunConfig, reader: R) -> Self {
        Self {
            config,
            reader,
            mapper: FileMapper::default(),
        }
    }

    /// Lists the regular files directly inside the source directory.
    ///
    /// Symlinks count when they point at a regular file. Subdirectories are
    /// not descended into and are not part of the list. Order is whatever the
    /// directory listing returns.
    pub fn scan(&self) -> OrganizeResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(&self.config.source).map_err(|e| OrganizeError::SourceReadFailed {
                path: self.config.source.clone(),
                source: e,
            })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Classifies a file, applying the exclude filters first.
    pub fn classify(&self, path: &Path) -> Classification {
        if self.config.filters.is_excluded(path) {
            return Classification::Skip(SkipReason::Excluded);
        }
        self.mapper.classify(path, self.config.categories)
    }

    fn timestamp(&self, path: &Path, category: Category) -> NaiveDateTime {
        match category {
            Category::Photo => self.reader.image_timestamp(path),
            Category::Video => self.reader.video_timestamp(path),
        }
    }

    /// Works out what a run would do without touching the filesystem.
    pub fn plan(&self) -> OrganizeResult<Vec<PlannedMove>> {
        let files = self.scan()?;
        Ok(files
            .into_iter()
            .map(|path| {
                let classification = self.classify(&path);
                let target = classification.category().map(|category| {
                    let timestamp = self.timestamp(&path, category);
                    (
                        FileOrganizer::bucket_dir(&self.config.destination, &timestamp),
                        timestamp,
                    )
                });
                PlannedMove {
                    path,
                    classification,
                    target,
                }
            })
            .collect())
    }

    /// Handles one file: skip it, or resolve its date and move it.
    fn process_file(&self, path: &Path) -> OrganizeResult<FileOutcome> {
        let category = match self.classify(path) {
            Classification::Skip(reason) => {
                debug!(path = %path.display(), reason = reason.describe(), "skipping");
                return Ok(FileOutcome::Skipped {
                    path: path.to_path_buf(),
                    reason,
                });
            }
            Classification::Photo => Category::Photo,
            Classification::Video => Category::Video,
        };

        let timestamp = self.timestamp(path, category);
        let moved = FileOrganizer::move_to_bucket(
            &self.config.destination,
            path,
            &timestamp,
            category,
            self.config.collision,
        )?;

        Ok(match moved {
            Some(operation) => {
                debug!(
                    from = %operation.original_path.display(),
                    to = %operation.new_path.display(),
                    "moved"
                );
                FileOutcome::Moved(operation)
            }
            None => FileOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::DestinationExists,
            },
        })
    }

    /// Organizes every file in the source directory.
    ///
    /// `on_event` receives `Started`, one `FileProcessed` per file and
    /// finally `Finished`. The first move failure stops the run and is
    /// returned; files moved before it stay moved.
    pub fn run<F>(&self, mut on_event: F) -> OrganizeResult<RunSummary>
    where
        F: FnMut(ProgressEvent),
    {
        let files = self.scan()?;
        let mut summary = RunSummary::new(files.len());
        info!(
            source = %self.config.source.display(),
            destination = %self.config.destination.display(),
            total = files.len(),
            "starting organize run"
        );
        on_event(ProgressEvent::Started { total: files.len() });

        for path in &files {
            let outcome = self.process_file(path)?;
            summary.record(&outcome);
            on_event(ProgressEvent::FileProcessed {
                progress: summary.progress,
                outcome,
            });
        }

        info!(
            processed = summary.progress.processed,
            moved = summary.progress.moved,
            "organize run finished"
        );
        on_event(ProgressEvent::Finished(summary.clone()));
        Ok(summary)
    }
}

/// An organize run executing on a background thread.
pub struct Worker {
    events: Receiver<ProgressEvent>,
    handle: JoinHandle<OrganizeResult<RunSummary>>,
}

impl Worker {
    /// Progress events, in order. The iterator ends when the run stops.
    pub fn events(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    /// Waits for the run to end and returns its result.
    pub fn join(self) -> OrganizeResult<RunSummary> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Starts an organize run on a single background thread.
///
/// The run cannot be cancelled once started.
pub fn spawn_worker<R>(config: RunConfig, reader: R) -> Worker
where
    R: MetadataReader + Send + 'static,
{
    let (sender, events) = mpsc::channel();
    let handle = thread::spawn(move || {
        let organizer = Organizer::new(config, reader);
        organizer.run(|event| {
            // The receiver may already be gone; the run still completes.
            let _ = sender.send(event);
        })
    });
    Worker { events, handle }
}
