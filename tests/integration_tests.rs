//! Integration tests for mediasort
//!
//! These tests run complete organize passes against temporary source and
//! destination directories.
//!
//! Test categories:
//! 1. Basic organization workflows
//! 2. Capture date resolution (EXIF, ffprobe, filesystem fallback)
//! 3. Category toggles and filters
//! 4. Collision policies
//! 5. Dry runs, validation and edge cases

use clap::Parser;
use mediasort::cli::{Cli, run_cli};
use mediasort::metadata::filesystem_timestamp;
use mediasort::{
    FileOrganizer, MediaMetadataReader, Organizer, ProgressEvent, RunConfig, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A source directory and a destination directory for one test.
struct TestFixture {
    source: TempDir,
    dest: TempDir,
    /// Holds an empty config file, so tests never pick up the user's settings.
    config_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let config_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(config_dir.path().join("empty.toml"), "").expect("Failed to write config");
        TestFixture {
            source: TempDir::new().expect("Failed to create temp directory"),
            dest: TempDir::new().expect("Failed to create temp directory"),
            config_dir,
        }
    }

    fn source(&self) -> &Path {
        self.source.path()
    }

    fn dest(&self) -> &Path {
        self.dest.path()
    }

    /// Create a file with content in the source directory.
    fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.source().join(name);
        fs::write(&path, content).expect("Failed to write file content");
        path
    }

    /// Run the CLI quietly with extra arguments after SOURCE and DESTINATION.
    fn run(&self, extra: &[&str]) -> Result<(), String> {
        let mut args: Vec<String> = vec![
            "mediasort".to_string(),
            self.source().display().to_string(),
            self.dest().display().to_string(),
            "--quiet".to_string(),
            "--config".to_string(),
            self.empty_config().display().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        run_cli(&Cli::parse_from(args))
    }

    fn empty_config(&self) -> PathBuf {
        self.config_dir.path().join("empty.toml")
    }

    fn assert_in_source(&self, name: &str) {
        let path = self.source().join(name);
        assert!(path.is_file(), "File should still be in source: {}", path.display());
    }

    fn assert_not_in_source(&self, name: &str) {
        let path = self.source().join(name);
        assert!(!path.exists(), "File should have left source: {}", path.display());
    }

    fn assert_in_dest(&self, rel_path: &str) {
        let path = self.dest().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    /// All files below the destination, relative to it, sorted.
    fn dest_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.dest(), &mut files);
        let mut relative: Vec<PathBuf> = files
            .into_iter()
            .filter_map(|p| p.strip_prefix(self.dest()).ok().map(Path::to_path_buf))
            .collect();
        relative.sort();
        relative
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

/// Writes an executable stand-in for ffprobe that prints `stdout` and exits with `code`.
#[cfg(unix)]
fn fake_ffprobe(dir: &Path, stdout: &str, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ffprobe");
    let script = format!("#!/bin/sh\ncat <<'JSON'\n{}\nJSON\nexit {}\n", stdout, code);
    fs::write(&path, script).expect("Failed to write fake ffprobe");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake ffprobe executable");
    path
}

// ============================================================================
// Test Data
// ============================================================================

/// Minimal JPEG carrying an EXIF DateTimeOriginal tag.
fn jpeg_with_capture_date(date: &str) -> Vec<u8> {
    let mut value = date.as_bytes().to_vec();
    value.push(0);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0 -> Exif IFD at offset 26
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD -> DateTimeOriginal at offset 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&value);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// The folder a file without embedded metadata will land in.
fn fallback_bucket(dest: &Path, file: &Path) -> PathBuf {
    FileOrganizer::bucket_dir(dest, &filesystem_timestamp(file))
}

const NO_FFPROBE: &str = "/non/existent/ffprobe";

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let result = fixture.run(&[]);

    assert!(result.is_ok(), "Should succeed on empty directory");
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_organize_photo_with_exif_date() {
    let fixture = TestFixture::new();
    fixture.create_file("photo1.jpg", &jpeg_with_capture_date("2023:05:14 08:15:00"));

    fixture.run(&[]).expect("Organization should succeed");

    fixture.assert_not_in_source("photo1.jpg");
    fixture.assert_in_dest("2023/05/photo1.jpg");
}

#[test]
fn test_unrecognized_file_stays_in_source() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.txt", b"shopping list");

    let config = RunConfig::new(fixture.source(), fixture.dest()).unwrap();
    let summary = Organizer::new(config, MediaMetadataReader::new(NO_FFPROBE))
        .run(|_| {})
        .expect("Organization should succeed");

    fixture.assert_in_source("notes.txt");
    assert!(fixture.dest_files().is_empty());
    assert_eq!(summary.progress.processed, 1);
    assert_eq!(summary.progress.moved, 0);
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    let mut content = jpeg_with_capture_date("2021:12:31 23:59:59");
    content.extend_from_slice(b"trailing bytes after EOI");
    fixture.create_file("nye.jpg", &content);

    fixture.run(&[]).expect("Organization should succeed");

    let moved = fs::read(fixture.dest().join("2021/12/nye.jpg")).unwrap();
    assert_eq!(moved, content);
}

#[test]
fn test_organize_mixed_case_extensions() {
    let fixture = TestFixture::new();
    fixture.create_file("UPPER.JPG", &jpeg_with_capture_date("2020:02:29 12:00:00"));
    fixture.create_file("Mixed.JpEg", &jpeg_with_capture_date("2020:03:01 12:00:00"));

    fixture.run(&[]).expect("Organization should succeed");

    fixture.assert_in_dest("2020/02/UPPER.JPG");
    fixture.assert_in_dest("2020/03/Mixed.JpEg");
}

#[test]
fn test_organize_special_characters_in_filename() {
    let fixture = TestFixture::new();
    let name = "holiday photo (1) é.jpg";
    fixture.create_file(name, &jpeg_with_capture_date("2019:07:04 18:00:00"));

    fixture.run(&[]).expect("Organization should succeed");

    fixture.assert_in_dest(&format!("2019/07/{}", name));
}

#[test]
fn test_organize_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", &jpeg_with_capture_date("2023:05:14 10:00:00"));
    fixture.create_file("b.png", b"no exif");

    fixture.run(&[]).expect("First run should succeed");
    let after_first = fixture.dest_files();
    assert_eq!(after_first.len(), 2);

    let config = RunConfig::new(fixture.source(), fixture.dest()).unwrap();
    let summary = Organizer::new(config, MediaMetadataReader::new(NO_FFPROBE))
        .run(|_| {})
        .expect("Second run should succeed");

    assert_eq!(summary.progress.moved, 0);
    assert_eq!(summary.progress.total, 0);
    assert_eq!(fixture.dest_files(), after_first);
}

#[test]
fn test_destination_created_when_missing() {
    let fixture = TestFixture::new();
    fixture.create_file("a.gif", &jpeg_with_capture_date("2018:01:01 00:00:00"));
    let nested = fixture.dest().join("library").join("media");

    let config = RunConfig::new(fixture.source(), &nested).unwrap();
    Organizer::new(config, MediaMetadataReader::new(NO_FFPROBE))
        .run(|_| {})
        .expect("Organization should succeed");

    assert!(nested.join("2018/01/a.gif").is_file());
}

// ============================================================================
// Test Suite 2: Capture Date Resolution
// ============================================================================

#[cfg(unix)]
#[test]
fn test_photo_and_video_scenario() {
    let fixture = TestFixture::new();
    let tools = TempDir::new().expect("Failed to create temp directory");
    let ffprobe = fake_ffprobe(
        tools.path(),
        r#"{"format": {"tags": {"creation_time": "2022-11-02T10:00:00.000000Z"}}}"#,
        0,
    );
    fixture.create_file("photo1.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file("clip1.mp4", b"\0\0\0\x18ftypmp42");

    fixture
        .run(&["--ffprobe", &ffprobe.display().to_string()])
        .expect("Organization should succeed");

    assert_eq!(
        fixture.dest_files(),
        vec![
            PathBuf::from("2022/11/clip1.mp4"),
            PathBuf::from("2023/05/photo1.jpg"),
        ]
    );
    fixture.assert_not_in_source("photo1.jpg");
    fixture.assert_not_in_source("clip1.mp4");
}

#[cfg(unix)]
#[test]
fn test_failing_ffprobe_falls_back_to_filesystem_time() {
    let fixture = TestFixture::new();
    let tools = TempDir::new().expect("Failed to create temp directory");
    let ffprobe = fake_ffprobe(tools.path(), "{}", 1);
    let clip = fixture.create_file("clip.mov", b"moov");
    let expected = fallback_bucket(fixture.dest(), &clip);

    fixture
        .run(&["--ffprobe", &ffprobe.display().to_string()])
        .expect("Organization should succeed");

    assert!(expected.join("clip.mov").is_file());
}

#[cfg(unix)]
#[test]
fn test_ffprobe_without_creation_time_falls_back() {
    let fixture = TestFixture::new();
    let tools = TempDir::new().expect("Failed to create temp directory");
    let ffprobe = fake_ffprobe(tools.path(), r#"{"format": {"tags": {}}}"#, 0);
    let clip = fixture.create_file("clip.avi", b"RIFF");
    let expected = fallback_bucket(fixture.dest(), &clip);

    fixture
        .run(&["--ffprobe", &ffprobe.display().to_string()])
        .expect("Organization should succeed");

    assert!(expected.join("clip.avi").is_file());
}

#[test]
fn test_missing_ffprobe_falls_back_to_filesystem_time() {
    let fixture = TestFixture::new();
    let clip = fixture.create_file("clip.wmv", b"wmv");
    let expected = fallback_bucket(fixture.dest(), &clip);

    fixture
        .run(&["--ffprobe", NO_FFPROBE])
        .expect("Organization should succeed");

    assert!(expected.join("clip.wmv").is_file());
}

#[test]
fn test_photo_without_exif_uses_filesystem_time() {
    let fixture = TestFixture::new();
    let photo = fixture.create_file("scan.bmp", b"BM not much of a bitmap");
    let expected = fallback_bucket(fixture.dest(), &photo);

    fixture.run(&[]).expect("Organization should succeed");

    assert!(expected.join("scan.bmp").is_file());
    fixture.assert_not_in_source("scan.bmp");
}

// ============================================================================
// Test Suite 3: Category Toggles and Filters
// ============================================================================

#[test]
fn test_photos_disabled_only_videos_move() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    let clip = fixture.create_file("b.mp4", b"mp4");
    let expected = fallback_bucket(fixture.dest(), &clip);

    let mut settings = Settings::default();
    settings.organize.photos = false;
    settings.organize.ffprobe = PathBuf::from(NO_FFPROBE);
    let config = RunConfig::from_settings(fixture.source(), fixture.dest(), &settings).unwrap();
    let summary = Organizer::new(config, MediaMetadataReader::new(NO_FFPROBE))
        .run(|_| {})
        .expect("Organization should succeed");

    fixture.assert_in_source("a.jpg");
    assert!(expected.join("b.mp4").is_file());
    assert_eq!(summary.progress.processed, 2);
    assert_eq!(summary.progress.moved, 1);
}

#[test]
fn test_no_videos_flag() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file("b.mp4", b"mp4");

    fixture.run(&["--no-videos"]).expect("Organization should succeed");

    fixture.assert_in_dest("2023/05/a.jpg");
    fixture.assert_in_source("b.mp4");
}

#[test]
fn test_no_category_selected_is_rejected() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));

    let result = fixture.run(&["--no-photos", "--no-videos"]);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("at least one file type"));
    fixture.assert_in_source("a.jpg");
}

#[test]
fn test_exclude_rules_from_config_file() {
    let fixture = TestFixture::new();
    fixture.create_file("keep.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file("draft.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file("IMG_1_edit.png", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file(".hidden.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));

    let config_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = config_dir.path().join("mediasort.toml");
    fs::write(
        &config_path,
        r#"
[filters.exclude]
filenames = ["draft.jpg"]
patterns = ["*_edit.*"]
"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "mediasort".to_string(),
        fixture.source().display().to_string(),
        fixture.dest().display().to_string(),
        "--quiet".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
    ]);
    run_cli(&cli).expect("Organization should succeed");

    fixture.assert_in_dest("2023/05/keep.jpg");
    fixture.assert_in_source("draft.jpg");
    fixture.assert_in_source("IMG_1_edit.png");
    // Hidden files are only excluded on request.
    fixture.assert_in_dest("2023/05/.hidden.jpg");
    fixture.assert_not_in_source(".hidden.jpg");
}

#[test]
fn test_hidden_files_excluded_when_configured() {
    let fixture = TestFixture::new();
    fixture.create_file("keep.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file(".hidden.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));

    let config_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = config_dir.path().join("mediasort.toml");
    fs::write(
        &config_path,
        r#"
[filters]
exclude_hidden_files = true
"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "mediasort".to_string(),
        fixture.source().display().to_string(),
        fixture.dest().display().to_string(),
        "--quiet".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
    ]);
    run_cli(&cli).expect("Organization should succeed");

    fixture.assert_in_dest("2023/05/keep.jpg");
    fixture.assert_in_source(".hidden.jpg");
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"x");
    let config_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = config_dir.path().join("bad.toml");
    fs::write(&config_path, "[filters.exclude]\npatterns = [\"[\"]\n").unwrap();

    let cli = Cli::parse_from([
        "mediasort".to_string(),
        fixture.source().display().to_string(),
        fixture.dest().display().to_string(),
        "--quiet".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
    ]);

    assert!(run_cli(&cli).is_err());
    fixture.assert_in_source("a.jpg");
}

// ============================================================================
// Test Suite 4: Collision Policies
// ============================================================================

fn fixture_with_existing(name: &str) -> TestFixture {
    let fixture = TestFixture::new();
    let bucket = fixture.dest().join("2023").join("05");
    fs::create_dir_all(&bucket).unwrap();
    fs::write(bucket.join(name), b"already organized").unwrap();
    fixture.create_file(name, &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture
}

#[test]
fn test_collision_rename_is_default() {
    let fixture = fixture_with_existing("a.jpg");

    fixture.run(&[]).expect("Organization should succeed");

    fixture.assert_not_in_source("a.jpg");
    assert_eq!(
        fs::read(fixture.dest().join("2023/05/a.jpg")).unwrap(),
        b"already organized"
    );
    fixture.assert_in_dest("2023/05/a-1.jpg");
}

#[test]
fn test_collision_skip() {
    let fixture = fixture_with_existing("a.jpg");

    fixture
        .run(&["--on-conflict", "skip"])
        .expect("Organization should succeed");

    fixture.assert_in_source("a.jpg");
    assert_eq!(fixture.dest_files(), vec![PathBuf::from("2023/05/a.jpg")]);
}

#[test]
fn test_collision_overwrite() {
    let fixture = fixture_with_existing("a.jpg");

    fixture
        .run(&["--on-conflict", "overwrite"])
        .expect("Organization should succeed");

    fixture.assert_not_in_source("a.jpg");
    assert_eq!(fixture.dest_files(), vec![PathBuf::from("2023/05/a.jpg")]);
    assert_ne!(
        fs::read(fixture.dest().join("2023/05/a.jpg")).unwrap(),
        b"already organized"
    );
}

// ============================================================================
// Test Suite 5: Dry Run, Progress and Edge Cases
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));
    fixture.create_file("b.txt", b"text");

    fixture.run(&["--dry-run"]).expect("Dry run should succeed");

    fixture.assert_in_source("a.jpg");
    fixture.assert_in_source("b.txt");
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_subdirectories_are_ignored() {
    let fixture = TestFixture::new();
    let nested = fixture.source().join("2019 trip");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("inner.jpg"), jpeg_with_capture_date("2019:08:01 10:00:00")).unwrap();
    fixture.create_file("outer.jpg", &jpeg_with_capture_date("2023:05:14 10:30:00"));

    fixture.run(&[]).expect("Organization should succeed");

    assert!(nested.join("inner.jpg").is_file());
    assert_eq!(fixture.dest_files(), vec![PathBuf::from("2023/05/outer.jpg")]);
}

#[test]
fn test_missing_source_is_rejected() {
    let fixture = TestFixture::new();
    let cli = Cli::parse_from([
        "mediasort".to_string(),
        fixture.source().join("missing").display().to_string(),
        fixture.dest().display().to_string(),
        "--quiet".to_string(),
    ]);

    assert!(run_cli(&cli).is_err());
}

#[test]
fn test_progress_reports_every_file() {
    let fixture = TestFixture::new();
    for i in 0..7 {
        fixture.create_file(&format!("img{}.png", i), &jpeg_with_capture_date("2023:05:14 10:30:00"));
    }
    fixture.create_file("readme.txt", b"x");

    let config = RunConfig::new(fixture.source(), fixture.dest()).unwrap();
    let worker = mediasort::spawn_worker(config, MediaMetadataReader::new(NO_FFPROBE));

    let mut processed = Vec::new();
    let mut total = None;
    let mut finished = false;
    for event in worker.events() {
        match event {
            ProgressEvent::Started { total: t } => total = Some(t),
            ProgressEvent::FileProcessed { progress, .. } => {
                assert_eq!(
                    progress.percentage(),
                    (progress.processed as u64 * 100) / progress.total as u64
                );
                processed.push(progress.processed);
            }
            ProgressEvent::Finished(summary) => {
                finished = true;
                assert_eq!(summary.progress.moved, 7);
                assert_eq!(
                    summary.progress.detail_message(),
                    "Files moved: 7 | Files left: 0 | Total files: 8"
                );
            }
        }
    }

    assert_eq!(total, Some(8));
    assert_eq!(processed, (1..=8).collect::<Vec<_>>());
    assert!(finished);
    assert_eq!(worker.join().unwrap().progress.processed, 8);
}
