//! mediasort - move photos and videos into year/month folders
//!
//! This library classifies media files by extension, resolves their capture
//! date from EXIF tags or ffprobe (falling back to filesystem timestamps), and
//! moves them into `destination/YYYY/MM` folders while reporting progress.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod metadata;
pub mod organize;
pub mod output;
pub mod progress;

pub use config::{ConfigError, RunConfig, Settings};
pub use file_category::{Category, Classification, EnabledCategories, FileMapper, SkipReason};
pub use file_organizer::{CollisionPolicy, FileOrganizer, OrganizeError};
pub use metadata::{MediaMetadataReader, MetadataReader};
pub use organize::{Organizer, Worker, spawn_worker};
pub use progress::{Progress, ProgressEvent, RunSummary};

pub use cli::{Cli, run_cli};
