//! Source archive discovery and extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;
use zip::ZipArchive;

use crate::error::Result;
use crate::path_utils::{EntryKind, collect_entries, has_extension};

/// Extension of source and output archives.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Lists the `.cbz` files (case-insensitive) directly inside `source_dir`, sorted by name.
///
/// Hidden files are included: `.Title.cbz` is extracted like any other archive.
pub async fn list_source_archives(source_dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(collect_entries(source_dir, EntryKind::Files, true)
        .await?
        .into_iter()
        .filter(|p| has_extension(p, ARCHIVE_EXTENSION))
        .collect())
}

/// Ledger identifier of an archive: its file name without the extension.
pub fn archive_id(archive: &Path) -> String {
    archive
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Extracts every entry of `archive` into `destination`.
///
/// Entry paths that would escape `destination` are rejected by the zip reader.
///
/// # Returns
///
/// * `Ok(usize)` - Number of entries in the archive
/// * `Err(Error::Zip)` - The container is unreadable or corrupt
pub async fn extract_archive(archive: &Path, destination: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let destination = destination.to_path_buf();

    spawn_blocking(move || -> Result<usize> {
        let file = File::open(&archive)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        let entries = zip.len();
        zip.extract(&destination)?;
        Ok(entries)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_id() {
        assert_eq!(archive_id(Path::new("Manga/Title.cbz")), "Title");
        assert_eq!(archive_id(Path::new("Vol.1 Title.CBZ")), "Vol.1 Title");
    }
}
