//! Path utilities for safe and robust file path handling.
//!
//! Helpers for turning paths into display strings, deriving base names the way the title
//! index expects them, listing directories in a stable order, and moving files across
//! file systems.

use crate::error::{Error, Result};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, ReadDir, read_dir};

/// Which kind of directory entry [`collect_entries`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Files,
    Directories,
    Any,
}

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Arguments
///
/// * `path` - The path to extract the file name from
///
/// # Returns
///
/// * `String` - The file name, using lossy conversion if necessary
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Returns a file name without its last extension.
///
/// A leading dot does not start an extension, so `.hidden` stays `.hidden` and
/// `page.001.jpg` becomes `page.001`.
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if file_name[..idx].trim_start_matches('.').is_empty() => file_name,
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}

/// Case-insensitive extension check, `ext` given without the dot.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
///
/// Applied to volume and chapter labels before they become directory names.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Lists the entries of `directory`, filtered by kind and sorted by file name.
///
/// # Arguments
///
/// * `directory` - Directory to scan
/// * `kind` - Which entries to keep
/// * `include_hidden` - Whether dot files are kept
///
/// # Returns
///
/// * `Result<Vec<PathBuf>>` - Matching paths in code point order of their names
pub async fn collect_entries(
    directory: &Path,
    kind: EntryKind,
    include_hidden: bool,
) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();

    let mut paths: ReadDir = read_dir(directory).await?;

    while let Some(entry) = paths.next_entry().await? {
        let path = entry.path();

        if !include_hidden && is_hidden_file(&path) {
            continue;
        }

        let is_dir = entry.file_type().await?.is_dir();
        match kind {
            EntryKind::Files if is_dir => continue,
            EntryKind::Directories if !is_dir => continue,
            _ => {}
        }

        entries.push(path);
    }

    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Moves `from` to `to`, copying and deleting when a rename cannot cross devices.
///
/// Only regular files take the copy fallback; a directory that cannot be renamed is an error.
pub async fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            let metadata = fs::metadata(from).await?;
            if metadata.is_dir() {
                return Err(Error::InvalidPath(
                    from.to_path_buf(),
                    format!("cannot move directory across devices to {:?}", to),
                ));
            }
            log::debug!("rename {:?} crosses devices, copying instead", from);
            fs::copy(from, to).await?;
            fs::remove_file(from).await?;
            Ok(())
        }
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to move '{}' to '{}': {}",
                path_to_string_lossy(from),
                path_to_string_lossy(to),
                e
            ),
        ))),
    }
}
