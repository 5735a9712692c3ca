//! Generator module provides the trait and implementation for output archive writers.
//!
//! The packager only ever writes CBZ files, but it does so through the [`Generator`]
//! interface so the writer can be driven page by page and finalized explicitly.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod cbz;

/// Common interface for archive writers.
///
/// A generator is created for one output file, receives its pages in the order they should
/// appear, and is consumed by [`Generator::save`].
#[async_trait]
pub trait Generator {
    /// Creates a new generator instance.
    ///
    /// # Parameters
    /// * `output_dir` - Directory where the generated file will be saved
    /// * `base_filename` - Base name of the output file without extension (e.g., "Chapter 3")
    ///
    /// # Returns
    /// * `Result<Self>` - A new generator instance or an error if the file cannot be created
    fn new(output_dir: &Path, base_filename: &str) -> Result<Self>
    where
        Self: Sized;

    /// Adds a page to the generated document.
    ///
    /// # Parameters
    /// * `image_path` - Path to the image file to add as a page
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Number of pages added so far.
    fn page_count(&self) -> usize;

    /// Finalizes the document and returns the path it was written to.
    async fn save(self) -> Result<PathBuf>;
}
