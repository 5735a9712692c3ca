//! Packages organized chapter directories into per-chapter CBZ archives.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;
use crate::extractor::ARCHIVE_EXTENSION;
use crate::generator::{Generator, cbz::Cbz};
use crate::path_utils::{
    EntryKind, collect_entries, get_file_name_lossy, has_extension, path_to_string_lossy,
};
use crate::types::{PackagedTitle, is_supported_image};

/// Packages every chapter of an organized title and cleans up its volumes.
///
/// Volumes and chapters are visited in name order. Each chapter directory holding at least
/// one supported image becomes `<volume>/<chapter>.cbz` containing those images sorted by
/// name. Afterwards [`cleanup_volume`] runs on the volume.
///
/// An error while writing an archive aborts the title before that volume is cleaned up, so
/// no images are deleted that did not make it into an archive.
pub async fn package_title(title_dir: &Path) -> Result<PackagedTitle> {
    let mut packaged = PackagedTitle::default();

    for volume_dir in collect_entries(title_dir, EntryKind::Directories, true).await? {
        for chapter_dir in collect_entries(&volume_dir, EntryKind::Directories, true).await? {
            if let Some(archive) = package_chapter(&volume_dir, &chapter_dir).await? {
                packaged.archives.push(archive);
            }
        }

        packaged
            .removed_directories
            .extend(cleanup_volume(&volume_dir).await?);
    }

    Ok(packaged)
}

/// Writes the archive for one chapter directory.
///
/// # Returns
///
/// * `Ok(Some(path))` - The archive written next to the chapter directory
/// * `Ok(None)` - The directory holds no supported image
pub async fn package_chapter(volume_dir: &Path, chapter_dir: &Path) -> Result<Option<PathBuf>> {
    let images: Vec<PathBuf> = collect_entries(chapter_dir, EntryKind::Files, true)
        .await?
        .into_iter()
        .filter(|p| is_supported_image(p))
        .collect();

    if images.is_empty() {
        log::debug!(
            "no images in {}, nothing to package",
            path_to_string_lossy(chapter_dir)
        );
        return Ok(None);
    }

    let cbz = Cbz::new(volume_dir, &get_file_name_lossy(chapter_dir))?;
    let output_path = cbz.output_path().to_path_buf();
    log::info!("Creating {}", path_to_string_lossy(&output_path));

    match write_pages(cbz, &images).await {
        Ok(archive) => Ok(Some(archive)),
        Err(e) => {
            // Drop the truncated archive; the chapter directory stays for a retry.
            if let Err(cleanup) = fs::remove_file(&output_path).await {
                log::warn!(
                    "Could not remove partial archive {:?}: {}",
                    output_path,
                    cleanup
                );
            }
            Err(e)
        }
    }
}

async fn write_pages(mut cbz: Cbz, images: &[PathBuf]) -> Result<PathBuf> {
    for image in images {
        cbz.add_page(image).await?;
    }
    cbz.save().await
}

/// Removes every sub-directory of a packaged volume.
///
/// Chapter directories are deleted whether or not they produced an archive, so empty chapter
/// directories do not outlive packaging. Only `.cbz` entries are left; a volume directory
/// that ends up empty is removed too.
pub async fn cleanup_volume(volume_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for dir in collect_entries(volume_dir, EntryKind::Directories, true).await? {
        if has_extension(&dir, ARCHIVE_EXTENSION) {
            continue;
        }
        fs::remove_dir_all(&dir).await?;
        log::debug!("removed {}", path_to_string_lossy(&dir));
        removed.push(dir);
    }

    if collect_entries(volume_dir, EntryKind::Any, true)
        .await?
        .is_empty()
    {
        fs::remove_dir(volume_dir).await?;
        removed.push(volume_dir.to_path_buf());
    }

    Ok(removed)
}
