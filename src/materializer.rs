//! Relocates classified files into the volume/chapter directory layout.

use std::path::Path;

use tokio::fs;

use crate::classifier::Classification;
use crate::error::Result;
use crate::path_utils::{move_path, path_to_string_lossy};
use crate::types::{BucketMove, MaterializeReport};

/// Moves every classified file from `archive_root` into `output_root/Volume X/Chapter Y`.
///
/// Directories are created for every chapter bucket, including buckets that matched nothing.
/// The first failed move aborts the archive and is returned; files moved before the failure
/// stay at their new location.
///
/// # Arguments
///
/// * `archive_root` - Extraction directory holding the flat file set
/// * `output_root` - Title directory receiving the volume directories
/// * `classification` - Result of [`crate::classifier::classify`] for this archive
///
/// # Returns
///
/// * `Ok(MaterializeReport)` - Per-bucket move counts and the unmatched count
/// * `Err(Error)` - Directory creation or a move failed
pub async fn materialize(
    archive_root: &Path,
    output_root: &Path,
    classification: &Classification,
) -> Result<MaterializeReport> {
    let mut report = MaterializeReport::default();

    for bucket in &classification.buckets {
        let destination = output_root.join(bucket.key.relative_path());
        fs::create_dir_all(&destination).await?;

        for file in &bucket.files {
            let from = archive_root.join(file);
            let to = destination.join(file);
            log::trace!(
                "moving {} -> {}",
                path_to_string_lossy(&from),
                path_to_string_lossy(&to)
            );
            move_path(&from, &to).await?;
        }

        if bucket.is_fallback() {
            report.unmatched = bucket.files.len();
            log::info!(
                "  Moved {} unmatched file(s) -> {}",
                bucket.files.len(),
                path_to_string_lossy(&destination)
            );
        } else {
            log::info!(
                "  Moved {} file(s) -> {}",
                bucket.files.len(),
                path_to_string_lossy(&destination)
            );
        }

        report.moves.push(BucketMove {
            destination,
            files: bucket.files.len(),
            fallback: bucket.is_fallback(),
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::test_utils::scratch_dir;
    use crate::types::TitleIndex;

    #[tokio::test]
    async fn test_materialize_moves_files_and_creates_empty_chapters() -> Result<()> {
        let root = scratch_dir("materialize_moves");
        let archive_root = root.join("extracted");
        let output_root = root.join("organized");
        std::fs::create_dir_all(&archive_root)?;
        for name in ["a1.jpg", "a2.jpg", "stray.png", "index.json"] {
            std::fs::write(archive_root.join(name), name.as_bytes())?;
        }

        let index = TitleIndex::from_json(
            r#"{"chapters": {
                "1": {"volume": 2, "number": 1, "name": "Ch. 1", "entries": "a"},
                "2": {"volume": 2, "number": 2, "name": "Ch. 2", "entries": "b"}
            }}"#,
        )?;
        let names = ["a1.jpg", "a2.jpg", "stray.png", "index.json"];
        let classification = classify(&index, &names, "index.json")?;

        let report = materialize(&archive_root, &output_root, &classification).await?;

        assert_eq!(report.total_moved(), 3);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.moves.len(), 3);

        let chapter_1 = output_root.join("Volume 2").join("Chapter 1");
        assert!(chapter_1.join("a1.jpg").is_file());
        assert!(chapter_1.join("a2.jpg").is_file());
        assert!(output_root.join("Volume 2").join("Chapter 2").is_dir());
        assert!(
            output_root
                .join("Volume 1")
                .join("Chapter 001")
                .join("stray.png")
                .is_file()
        );

        assert!(!archive_root.join("a1.jpg").exists());
        assert!(archive_root.join("index.json").is_file());

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_materialize_reports_missing_source() -> Result<()> {
        let root = scratch_dir("materialize_missing");
        let index = TitleIndex::from_json(r#"{"chapters": {"1": {"number": 1, "entries": "a"}}}"#)?;
        let classification = classify(&index, &["a1.jpg"], "index.json")?;

        let result = materialize(&root.join("nothing"), &root.join("out"), &classification).await;
        assert!(result.is_err());

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }
}
