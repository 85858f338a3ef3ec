//! Command-line interface module for mediasort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging the settings file with command-line overrides
//! - Validating the run before anything is moved
//! - Rendering progress from the background worker

use crate::config::{RunConfig, Settings};
use crate::file_category::Classification;
use crate::file_organizer::CollisionPolicy;
use crate::metadata::MediaMetadataReader;
use crate::organize::{Organizer, spawn_worker};
use crate::output::OutputFormatter;
use crate::progress::{FileOutcome, Progress, ProgressEvent, SUCCESS_MESSAGE};
use clap::Parser;
use std::path::PathBuf;

/// Move photos and videos into year/month folders by capture date.
#[derive(Debug, Clone, Parser)]
#[command(name = "mediasort", version)]
#[command(
    long_about = "Moves photos and videos from SOURCE into DESTINATION/YYYY/MM folders.

The date comes from the EXIF capture time for photos and from the container
creation time (read with ffprobe) for videos, falling back to the file's
filesystem timestamp. Only files directly inside SOURCE are considered;
subdirectories are left alone.

Photos: png, jpg, jpeg, gif, bmp
Videos: mp4, mov, avi, wmv"
)]
pub struct Cli {
    /// Directory to take files from
    pub source: PathBuf,

    /// Directory to organize files into (created if missing)
    pub destination: PathBuf,

    /// Leave photos in place
    #[arg(long)]
    pub no_photos: bool,

    /// Leave videos in place
    #[arg(long)]
    pub no_videos: bool,

    /// What to do when a file with the same name already exists: rename, skip or overwrite
    #[arg(long, value_name = "POLICY")]
    pub on_conflict: Option<CollisionPolicy>,

    /// ffprobe program used to read video creation times
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Configuration file (default: ./.mediasortrc.toml, then ~/.config/mediasort/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show where files would go without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v=debug, -vv=trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Applies command-line overrides on top of file settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if self.no_photos {
            settings.organize.photos = false;
        }
        if self.no_videos {
            settings.organize.videos = false;
        }
        if let Some(policy) = self.on_conflict {
            settings.organize.on_conflict = policy;
        }
        if let Some(ffprobe) = &self.ffprobe {
            settings.organize.ffprobe = ffprobe.clone();
        }
    }

    /// Loads settings and builds the validated run configuration.
    pub fn run_config(&self) -> Result<RunConfig, String> {
        let mut settings = Settings::load(self.config.as_deref())
            .map_err(|e| format!("Error loading configuration: {}", e))?;
        self.apply_to(&mut settings);

        RunConfig::from_settings(&self.source, &self.destination, &settings)
            .map_err(|e| e.to_string())
    }
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediasort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["mediasort", "/path/to/inbox", "/path/to/library"]);
/// match run_cli(&cli) {
///     Ok(()) => println!("Done"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let config = cli.run_config()?;
    let reader = MediaMetadataReader::new(config.ffprobe.clone());

    if cli.dry_run {
        organize_dry_run(config, reader)
    } else {
        organize(config, reader, cli.quiet)
    }
}

/// Runs the organizer on a background thread and renders its progress.
fn organize(config: RunConfig, reader: MediaMetadataReader, quiet: bool) -> Result<(), String> {
    if !quiet {
        OutputFormatter::info(&format!(
            "Organizing {} into {}",
            config.source.display(),
            config.destination.display()
        ));
    }

    let pb = OutputFormatter::create_progress_bar(!quiet);
    let worker = spawn_worker(config, reader);

    for event in worker.events() {
        match event {
            ProgressEvent::Started { total } => {
                OutputFormatter::show_progress(&pb, &Progress::new(total));
            }
            ProgressEvent::FileProcessed { progress, outcome } => {
                OutputFormatter::show_progress(&pb, &progress);
                if let FileOutcome::Moved(op) = &outcome {
                    pb.println(format!(
                        " - {} → {}",
                        op.original_path.display(),
                        op.new_path.display()
                    ));
                }
            }
            ProgressEvent::Finished(_) => pb.finish_with_message(SUCCESS_MESSAGE),
        }
    }

    match worker.join() {
        Ok(summary) => {
            if !quiet {
                OutputFormatter::plain(&summary.progress.detail_message());
                OutputFormatter::summary_table(&summary);
                OutputFormatter::success(SUCCESS_MESSAGE);
            }
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(format!("Organization stopped: {}", e))
        }
    }
}

/// Prints where every file would go without moving anything.
fn organize_dry_run(config: RunConfig, reader: MediaMetadataReader) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", config.source.display()));

    let organizer = Organizer::new(config, reader);
    let plan = organizer.plan().map_err(|e| e.to_string())?;

    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let mut would_move = 0;
    for planned in &plan {
        let name = planned
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match (&planned.classification, &planned.target) {
            (Classification::Skip(reason), _) => {
                OutputFormatter::plain(&format!(" - {} (left in place: {})", name, reason.describe()));
            }
            (_, Some((folder, timestamp))) => {
                would_move += 1;
                OutputFormatter::plain(&format!(
                    " - {} [{}] → would move to {}",
                    name,
                    timestamp.format("%Y-%m-%d %H:%M:%S"),
                    folder.display()
                ));
            }
            (_, None) => {}
        }
    }

    OutputFormatter::header("DRY RUN SUMMARY");
    OutputFormatter::plain(&format!("Total files: {}", plan.len()));
    OutputFormatter::plain(&format!("Would move: {}", would_move));
    OutputFormatter::plain(&format!("Would leave in place: {}", plan.len() - would_move));
    OutputFormatter::success("Dry run complete. No files were modified.");

    Ok(())
}
