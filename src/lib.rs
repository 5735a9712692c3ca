//! Pagemaster - Per-Chapter CBZ Pipeline
//!
//! This crate turns a directory of CBZ archives, each carrying an `index.json` chapter map,
//! into one CBZ archive per chapter, laid out as `<title>/Volume X/Chapter Y.cbz`.
//!
//! The work happens in three stages, each driven by [`PagemasterConfig`]:
//!
//! 1. **Extract**: every source archive is unpacked into the extraction directory and
//!    recorded in the [`ledger::Ledger`].
//! 2. **Organize**: for every ledger entry, the title index is read, the extracted files are
//!    classified into volume/chapter buckets ([`classifier`]) and moved there
//!    ([`materializer`]).
//! 3. **Package**: every chapter directory with images becomes its own archive
//!    ([`packager`]), and the image directories are removed.
//!
//! ```rust,no_run
//! use pagemaster::prelude::*;
//! use std::path::PathBuf;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> pagemaster::error::Result<()> {
//!     let config = PagemasterConfig::builder()
//!         .source_path(PathBuf::from("./Manga"))
//!         .extract_path(PathBuf::from("./extracted"))
//!         .output_path(PathBuf::from("./organized"))
//!         .build()?;
//!
//!     let manifest = PathBuf::from("manifest.json");
//!     let mut ledger = Ledger::load(&manifest).await?;
//!
//!     let report = config.run(&mut ledger).await?;
//!     ledger.save(&manifest).await?;
//!
//!     for (title, error) in &report.organize.failed {
//!         eprintln!("{}: {}", title, error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Stages process one archive at a time. Organize and package move and delete files, so
//! they cannot be repeated on the same archive without extracting it again.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod ledger;
pub mod materializer;
pub mod menu;
pub mod packager;
pub mod pagemaster;
pub mod path_utils;
pub mod settings;
#[cfg(test)]
mod test_utils;
pub mod types;

pub use pagemaster::PagemasterConfig;
pub use pagemaster::PagemasterConfigBuilder;

pub use types::{
    ChapterDescriptor, ChapterNumber, ExtractReport, MaterializeReport, OrganizeReport,
    PackageReport, PackagedTitle, PipelineReport, PipelineStage, SkipReason, StageReport,
    TitleIndex,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{
        ChapterDescriptor, ChapterNumber, ExtractReport, MaterializeReport, OrganizeReport,
        PackageReport, PackagedTitle, PagemasterConfig, PagemasterConfigBuilder, PipelineReport,
        PipelineStage, SkipReason, StageReport, TitleIndex, error, types,
    };
    pub use crate::classifier::{BucketKey, Classification, VolumeOrder, classify};
    pub use crate::ledger::Ledger;
    pub use crate::settings::Settings;
    pub use std::path::{Path, PathBuf};
}
