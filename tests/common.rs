//! Common test utilities and constants for the Pagemaster crate.
//!
//! Provides functions for setting up scratch directories, writing fixture CBZ archives and
//! inspecting the archives the pipeline produces.

use pagemaster::PagemasterConfig;
use rand::{Rng, distributions::Alphanumeric};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A minimal JPEG-looking payload; the pipeline never decodes images.
#[allow(dead_code)]
pub const FAKE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9,
];

/// Scratch directories of one test.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub extract_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestDirs {
    /// A pipeline configuration over these directories.
    #[allow(dead_code)]
    pub fn config(&self) -> PagemasterConfig {
        PagemasterConfig::builder()
            .source_path(self.source_dir.clone())
            .extract_path(self.extract_dir.clone())
            .output_path(self.output_dir.clone())
            .build()
            .unwrap()
    }

    #[allow(dead_code)]
    pub fn manifest(&self) -> PathBuf {
        self.test_dir.join("manifest.json")
    }
}

/// Creates a clean, uniquely named test directory with source/extracted/organized inside.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let extract_dir = test_dir.join("extracted");
    let output_dir = test_dir.join("organized");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&extract_dir).await.unwrap();
    fs::create_dir_all(&output_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        extract_dir,
        output_dir,
    }
}

/// Removes a test directory once the test is done with it.
#[allow(dead_code)]
pub async fn cleanup_test_dir(dirs: &TestDirs) {
    let _ = fs::remove_dir_all(&dirs.test_dir).await;
}

/// Writes a CBZ at `path` holding `entries` (name, content) in the given order.
#[allow(dead_code)]
pub fn write_fixture_archive(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a CBZ holding an `index.json` with `index` plus one fake image per name.
#[allow(dead_code)]
pub fn write_title_archive(path: &Path, index: &str, images: &[&str]) {
    let mut entries: Vec<(&str, &[u8])> = vec![("index.json", index.as_bytes())];
    entries.extend(images.iter().map(|name| (*name, FAKE_JPEG)));
    write_fixture_archive(path, &entries);
}

/// Writes a fake image file, creating parent directories.
#[allow(dead_code)]
pub async fn create_dummy_image(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.unwrap();
    }
    fs::write(path, FAKE_JPEG).await.unwrap();
}

/// Entry names of a ZIP file, in archive order.
#[allow(dead_code)]
pub fn archive_entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Checks that a ZIP file exists and contains at least one entry.
#[allow(dead_code)]
pub async fn assert_valid_zip_file(path: &Path) {
    assert!(path.exists(), "Output ZIP file does not exist: {:?}", path);
    assert!(path.is_file(), "Output ZIP path is not a file: {:?}", path);

    let file = fs::File::open(path).await.unwrap();
    let file_std = file.into_std().await;
    let zip = zip::ZipArchive::new(file_std).unwrap();
    assert!(zip.len() > 0, "Output ZIP file is empty: {:?}", path);
}

/// Names of the entries directly inside `dir`, sorted.
#[allow(dead_code)]
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
