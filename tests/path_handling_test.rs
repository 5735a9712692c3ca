//! Tests for directory listing and file moves on real directories.

use pagemaster::error::Result;
use pagemaster::path_utils::*;
use tokio::fs;

mod common;
use common::{cleanup_test_dir, create_dummy_image, setup_test_dirs};

#[tokio::test]
async fn test_collect_entries_filters_and_sorts() -> Result<()> {
    let test_dirs = setup_test_dirs("collect_entries").await;
    let dir = &test_dirs.source_dir;
    create_dummy_image(&dir.join("b.jpg")).await;
    create_dummy_image(&dir.join("B.jpg")).await;
    create_dummy_image(&dir.join("a.jpg")).await;
    create_dummy_image(&dir.join(".hidden.jpg")).await;
    fs::create_dir_all(dir.join("sub")).await?;

    let names = |paths: Vec<std::path::PathBuf>| -> Vec<String> {
        paths.iter().map(|p| get_file_name_lossy(p)).collect()
    };

    // Code point order: upper case sorts before lower case.
    assert_eq!(
        names(collect_entries(dir, EntryKind::Files, false).await?),
        vec!["B.jpg", "a.jpg", "b.jpg"]
    );
    assert_eq!(
        names(collect_entries(dir, EntryKind::Files, true).await?),
        vec![".hidden.jpg", "B.jpg", "a.jpg", "b.jpg"]
    );
    assert_eq!(
        names(collect_entries(dir, EntryKind::Directories, true).await?),
        vec!["sub"]
    );
    assert_eq!(collect_entries(dir, EntryKind::Any, true).await?.len(), 5);

    cleanup_test_dir(&test_dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_collect_entries_missing_directory() {
    let result = collect_entries(
        std::path::Path::new("tests/tmp/does-not-exist"),
        EntryKind::Any,
        true,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_move_path_moves_files_and_directories() -> Result<()> {
    let test_dirs = setup_test_dirs("move_path").await;
    let from_file = test_dirs.extract_dir.join("page 01.jpg");
    create_dummy_image(&from_file).await;
    let from_dir = test_dirs.extract_dir.join("extras");
    create_dummy_image(&from_dir.join("x.png")).await;

    let to_file = test_dirs.output_dir.join("page 01.jpg");
    let to_dir = test_dirs.output_dir.join("extras");
    move_path(&from_file, &to_file).await?;
    move_path(&from_dir, &to_dir).await?;

    assert!(!from_file.exists());
    assert!(to_file.is_file());
    assert!(!from_dir.exists());
    assert!(to_dir.join("x.png").is_file());

    // Moving something that is gone reports the source path.
    let err = move_path(&from_file, &to_file).await.unwrap_err();
    assert!(err.to_string().contains("page 01.jpg"));

    cleanup_test_dir(&test_dirs).await;
    Ok(())
}
