/// Moving files into year/month folders.
///
/// This module computes the `YYYY/MM` folder for a timestamp, creates it when
/// needed, and moves a file into it while applying a [`CollisionPolicy`] for
/// names that are already taken.
use crate::file_category::Category;
use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Record of a single move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The path of the file before the move.
    pub original_path: PathBuf,
    /// The path of the file after the move.
    pub new_path: PathBuf,
    /// The category the file was organized as.
    pub category: Category,
}

/// What to do when the target folder already holds a file with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Pick a free name by appending `-1`, `-2`, ... to the file stem.
    #[default]
    Rename,
    /// Leave the source file where it is.
    Skip,
    /// Replace the existing file.
    Overwrite,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!(
                "unknown collision policy '{}': expected rename, skip or overwrite",
                other
            )),
        }
    }
}

/// Errors that can occur while organizing files.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory could not be listed.
    SourceReadFailed { path: PathBuf, source: io::Error },
    /// Failed to create a year/month directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file into its year/month directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceReadFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SourceReadFailed { source, .. } | Self::DirectoryCreationFailed { source, .. } => {
                Some(source)
            }
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves files into `destination/YYYY/MM` folders.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Returns the year/month folder for a timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use mediasort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let taken = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// assert_eq!(
    ///     FileOrganizer::bucket_dir(Path::new("/photos"), &taken),
    ///     Path::new("/photos/2023/05")
    /// );
    /// ```
    pub fn bucket_dir(destination: &Path, timestamp: &NaiveDateTime) -> PathBuf {
        destination
            .join(format!("{:04}", timestamp.year()))
            .join(format!("{:02}", timestamp.month()))
    }

    /// Moves a file into the year/month folder of `timestamp` and records the move.
    ///
    /// The folder and any missing parents are created first. Returns
    /// `Ok(None)` when the name is taken and the policy is
    /// [`CollisionPolicy::Skip`]; the file is then left untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chrono::NaiveDate;
    /// use mediasort::file_category::Category;
    /// use mediasort::file_organizer::{CollisionPolicy, FileOrganizer};
    /// use std::path::Path;
    ///
    /// let taken = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// let result = FileOrganizer::move_to_bucket(
    ///     Path::new("/path/to/library"),
    ///     Path::new("/path/to/inbox/IMG_0001.jpg"),
    ///     &taken,
    ///     Category::Photo,
    ///     CollisionPolicy::Rename,
    /// );
    ///
    /// match result {
    ///     Ok(Some(op)) => println!("Moved to {}", op.new_path.display()),
    ///     Ok(None) => println!("Left in place"),
    ///     Err(e) => eprintln!("Move failed: {}", e),
    /// }
    /// ```
    pub fn move_to_bucket(
        destination: &Path,
        file_path: &Path,
        timestamp: &NaiveDateTime,
        category: Category,
        policy: CollisionPolicy,
    ) -> OrganizeResult<Option<Operation>> {
        let bucket = Self::bucket_dir(destination, timestamp);

        fs::create_dir_all(&bucket).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: bucket.clone(),
            source: e,
        })?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                source: file_path.to_path_buf(),
                destination: bucket.clone(),
                source_error: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let mut destination_path = bucket.join(file_name);
        if destination_path.exists() {
            match policy {
                CollisionPolicy::Skip => {
                    debug!(path = %destination_path.display(), "destination exists, skipping");
                    return Ok(None);
                }
                CollisionPolicy::Rename => {
                    destination_path = Self::free_name(&destination_path);
                }
                CollisionPolicy::Overwrite => {}
            }
        }

        Self::move_file(file_path, &destination_path).map_err(|e| {
            OrganizeError::FileMoveFailure {
                source: file_path.to_path_buf(),
                destination: destination_path.clone(),
                source_error: e,
            }
        })?;

        Ok(Some(Operation {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category,
        }))
    }

    /// First non-existing `stem-N.ext` next to `taken`.
    fn free_name(taken: &Path) -> PathBuf {
        let parent = taken.parent().unwrap_or_else(|| Path::new(""));
        let stem = taken
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = taken.extension().map(|e| e.to_string_lossy().into_owned());

        (1u32..)
            .map(|n| match &extension {
                Some(ext) => parent.join(format!("{}-{}.{}", stem, n, ext)),
                None => parent.join(format!("{}-{}", stem, n)),
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| taken.to_path_buf())
    }

    /// Renames a file, copying and deleting when it crosses filesystems.
    fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(from = %from.display(), to = %to.display(), "cross-device move, copying");
                Self::copy_then_remove(from, to)
            }
            other => other,
        }
    }

    /// Copies `from` to `to`, then removes `from`.
    ///
    /// If the source cannot be removed, the copy is deleted again so the file
    /// only exists in one place.
    fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to)?;
        if let Err(e) = fs::remove_file(from) {
            if let Err(cleanup) = fs::remove_file(to) {
                debug!(path = %to.display(), error = %cleanup, "could not remove copy");
            }
            return Err(e);
        }
        Ok(())
    }
}
