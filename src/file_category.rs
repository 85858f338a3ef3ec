/// Media classification by file extension.
///
/// This module maps file extensions to the two media categories the organizer
/// handles (photos and videos) and decides whether a file should be moved or
/// left alone, given which categories the user enabled.
///
/// # Examples
///
/// ```
/// use mediasort::file_category::{Classification, EnabledCategories, FileMapper};
/// use std::path::Path;
///
/// let mapper = FileMapper::default();
/// let enabled = EnabledCategories::all();
/// assert_eq!(mapper.classify(Path::new("IMG_0001.JPG"), enabled), Classification::Photo);
/// assert_eq!(mapper.classify(Path::new("clip.mov"), enabled), Classification::Video);
/// ```
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Extensions recognized as photos.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Extensions recognized as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "wmv"];

/// A media category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Still images (PNG, JPG, GIF, BMP)
    Photo,
    /// Video files (MP4, MOV, AVI, WMV)
    Video,
}

impl Category {
    /// Lowercase name used in output and operation records.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Photo => "photo",
            Category::Video => "video",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a file was left in the source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The extension is neither a photo nor a video extension.
    Unrecognized,
    /// The file is a photo or video but its category was turned off.
    CategoryDisabled,
    /// An exclude rule from the configuration matched the file.
    Excluded,
    /// A file with the same name already exists in the target folder.
    DestinationExists,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::Unrecognized => "not a photo or video",
            SkipReason::CategoryDisabled => "category disabled",
            SkipReason::Excluded => "excluded by filter",
            SkipReason::DestinationExists => "already exists at destination",
        }
    }
}

/// Result of classifying a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Photo,
    Video,
    Skip(SkipReason),
}

impl Classification {
    /// The category to move the file under, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            Classification::Photo => Some(Category::Photo),
            Classification::Video => Some(Category::Video),
            Classification::Skip(_) => None,
        }
    }
}

/// Which categories a run should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledCategories {
    pub photos: bool,
    pub videos: bool,
}

impl EnabledCategories {
    /// Both photos and videos.
    pub fn all() -> Self {
        Self {
            photos: true,
            videos: true,
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        match category {
            Category::Photo => self.photos,
            Category::Video => self.videos,
        }
    }

    /// True when at least one category is enabled.
    pub fn any(&self) -> bool {
        self.photos || self.videos
    }
}

impl Default for EnabledCategories {
    fn default() -> Self {
        Self::all()
    }
}

/// Maps file extensions to media categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a `FileMapper` with the standard photo and video extensions.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        for ext in PHOTO_EXTENSIONS {
            mapper.add_extension_mapping(ext, Category::Photo);
        }
        for ext in VIDEO_EXTENSIONS {
            mapper.add_extension_mapping(ext, Category::Video);
        }
        mapper
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps a file extension to a category, ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediasort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category("JPEG"), Some(Category::Photo));
    /// assert_eq!(mapper.extension_to_category("txt"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Classifies a file from its extension and the enabled categories.
    ///
    /// The extension is whatever follows the last `.` of the file name, so a
    /// file called `.jpg` is a photo. Names that are not valid UTF-8 are
    /// matched lossily. The file does not need to exist.
    pub fn classify(&self, path: &Path, enabled: EnabledCategories) -> Classification {
        let category = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .and_then(|name| {
                name.rsplit_once('.')
                    .and_then(|(_, ext)| self.extension_to_category(ext))
            });

        match category {
            None => Classification::Skip(SkipReason::Unrecognized),
            Some(category) if !enabled.contains(category) => {
                Classification::Skip(SkipReason::CategoryDisabled)
            }
            Some(Category::Photo) => Classification::Photo,
            Some(Category::Video) => Classification::Video,
        }
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
