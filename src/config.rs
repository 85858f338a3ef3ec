//! Configuration: the optional TOML settings file and the validated
//! per-run configuration built from it.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! photos = true
//! videos = true
//! on_conflict = "rename"   # rename | skip | overwrite
//! ffprobe = "ffprobe"
//!
//! [filters]
//! exclude_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp", "IMG_*_edit.*"]
//! regex = ["^DSC\\d+ \\(copy\\)"]
//! ```
//!
//! Every section and key is optional.

use crate::file_category::EnabledCategories;
use crate::file_organizer::CollisionPolicy;
use crate::metadata::DEFAULT_FFPROBE;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".mediasortrc.toml";

/// Errors that can occur while loading configuration or validating a run.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
    /// A required path was not given.
    MissingPath(&'static str),
    /// The source path is not a readable directory.
    InvalidSource(PathBuf),
    /// The destination exists but is not a directory.
    InvalidDestination(PathBuf),
    /// Neither photos nor videos are enabled.
    NoCategorySelected,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::MissingPath(which) => {
                write!(f, "Please select both source and destination folders ({} is missing)", which)
            }
            ConfigError::InvalidSource(path) => {
                write!(f, "Source folder is not a directory: {}", path.display())
            }
            ConfigError::InvalidDestination(path) => {
                write!(f, "Destination is not a directory: {}", path.display())
            }
            ConfigError::NoCategorySelected => {
                write!(f, "Please select at least one file type to organize")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub organize: OrganizeSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Defaults for the organize run itself.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizeSettings {
    /// Move photos. Defaults to true.
    #[serde(default = "default_true")]
    pub photos: bool,
    /// Move videos. Defaults to true.
    #[serde(default = "default_true")]
    pub videos: bool,
    /// What to do with name collisions in the destination.
    #[serde(default)]
    pub on_conflict: CollisionPolicy,
    /// Program used to read video creation times.
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from(DEFAULT_FFPROBE)
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            photos: true,
            videos: true,
            on_conflict: CollisionPolicy::default(),
            ffprobe: default_ffprobe(),
        }
    }
}

impl OrganizeSettings {
    pub fn categories(&self) -> EnabledCategories {
        EnabledCategories {
            photos: self.photos,
            videos: self.videos,
        }
    }
}

/// Rules deciding which source files are never touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    /// Leave hidden files (starting with ".") alone. Defaults to false.
    #[serde(default)]
    pub exclude_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Exclusion rules, all matched against the file name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns to exclude.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.mediasortrc.toml` in the current directory
    /// 3. Look for `~/.config/mediasort/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediasort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Pre-compiled exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Compile filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_hidden_files: rules.exclude_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// True if the file must be left alone.
    ///
    /// Hidden files are excluded only when configured; exact names, glob
    /// patterns and regexes are checked against the file name.
    pub fn is_excluded(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_hidden_files && file_name.starts_with('.') {
            return true;
        }

        self.exclude_filenames.contains(file_name.as_ref())
            || self
                .exclude_patterns
                .iter()
                .any(|pattern| pattern.matches(&file_name))
            || self
                .exclude_regexes
                .iter()
                .any(|regex| regex.is_match(&file_name))
    }
}

/// Everything one organize run needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub categories: EnabledCategories,
    pub collision: CollisionPolicy,
    pub ffprobe: PathBuf,
    pub filters: CompiledFilters,
}

impl RunConfig {
    /// Validated configuration with default settings.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_settings(source, destination, &Settings::default())
    }

    /// Validates paths and settings before a run starts.
    ///
    /// # Errors
    ///
    /// - `MissingPath` if either path is empty
    /// - `InvalidSource` if the source is not a directory
    /// - `InvalidDestination` if the destination exists and is not a directory
    /// - `NoCategorySelected` if photos and videos are both disabled
    /// - glob/regex errors from the filter rules
    pub fn from_settings(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        let source = source.into();
        let destination = destination.into();

        if source.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("source"));
        }
        if destination.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("destination"));
        }

        let categories = settings.organize.categories();
        if !categories.any() {
            return Err(ConfigError::NoCategorySelected);
        }

        if !source.is_dir() {
            return Err(ConfigError::InvalidSource(source));
        }
        if destination.exists() && !destination.is_dir() {
            return Err(ConfigError::InvalidDestination(destination));
        }

        Ok(Self {
            source,
            destination,
            categories,
            collision: settings.organize.on_conflict,
            ffprobe: settings.organize.ffprobe.clone(),
            filters: CompiledFilters::new(&settings.filters)?,
        })
    }
}
