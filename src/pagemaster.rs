use std::path::{Path, PathBuf};

use tokio::fs;

use crate::classifier::classify;
use crate::error::{Error, Result};
use crate::extractor::{archive_id, extract_archive, list_source_archives};
use crate::ledger::Ledger;
use crate::materializer::materialize;
use crate::packager::package_title;
use crate::path_utils::{EntryKind, collect_entries, get_file_name_lossy, path_to_string_lossy};
use crate::types::{
    DEFAULT_INDEX_FILE, ExtractReport, ExtractedArchive, MaterializeReport, OrganizeReport,
    PackageReport, PipelineReport, PipelineStage, SkipReason, TitleIndex,
};

/// The runtime pipeline configuration, built declaratively using the builder pattern.
///
/// It holds the three working directories and drives the stages:
///
/// - [`extract`](PagemasterConfig::extract): source archives into the extraction directory
/// - [`organize`](PagemasterConfig::organize): extracted files into volume/chapter directories
/// - [`package`](PagemasterConfig::package): chapter directories into per-chapter archives
/// - [`run`](PagemasterConfig::run): all three in order
///
/// Every stage processes archives one at a time, in ledger order. A failure of one archive is
/// recorded in the stage report and the stage moves on to the next archive.
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use pagemaster::prelude::*;
/// # use std::path::PathBuf;
/// let config = PagemasterConfig::builder()
///     .source_path(PathBuf::from("./Manga"))
///     .extract_path(PathBuf::from("./extracted"))
///     .output_path(PathBuf::from("./organized"))
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PagemasterConfig {
    /// Directory containing the source `.cbz` archives.
    #[builder(default)]
    pub source_path: PathBuf,

    /// Scratch directory; each archive is extracted into `extract_path/<archive id>`.
    #[builder(default)]
    pub extract_path: PathBuf,

    /// Organized tree; each title lands in `output_path/<archive id>`.
    #[builder(default)]
    pub output_path: PathBuf,

    /// File name of the title index inside each extraction directory.
    #[builder(default = "DEFAULT_INDEX_FILE.to_string()")]
    pub index_file_name: String,

    /// Whether a successfully organized archive's extraction directory is deleted.
    ///
    /// Directories of archives that failed to organize are always left in place.
    #[builder(default = "true")]
    pub purge_extracted: bool,
}

impl PagemasterConfig {
    /// Creates a new builder for configuring `PagemasterConfig`.
    pub fn builder() -> PagemasterConfigBuilder {
        PagemasterConfigBuilder::default()
    }

    /// Performs file system checks for a specific stage.
    ///
    /// # Arguments
    ///
    /// * `stage` - The stage about to run:
    ///   - [`PipelineStage::Extract`]: `source_path` must exist and be a directory
    ///   - [`PipelineStage::Organize`]: `extract_path` must exist and be a directory
    ///   - [`PipelineStage::Package`]: `output_path` must exist and be a directory
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - The stage can run
    /// * `Err(Error)` - [`Error::NotFound`] or [`Error::InvalidPath`] naming the directory
    pub fn preflight_check(&self, stage: PipelineStage) -> Result<&Self> {
        let (path, role) = match stage {
            PipelineStage::Extract => (&self.source_path, "Source"),
            PipelineStage::Organize => (&self.extract_path, "Extraction"),
            PipelineStage::Package => (&self.output_path, "Output"),
        };

        if !path.exists() {
            return Err(Error::NotFound(format!(
                "{} directory does not exist: {:?}",
                role, path
            )));
        }
        if !path.is_dir() {
            return Err(Error::InvalidPath(
                path.clone(),
                format!("{} path must be a directory, not a file.", role),
            ));
        }

        Ok(self)
    }

    // --- Stage entry points ---

    /// Extracts every source archive that has not been extracted yet.
    ///
    /// An archive whose extraction directory already exists is skipped. A corrupt archive is
    /// reported, its partial extraction directory removed, and the stage continues. Every
    /// archive extracted successfully is added to `ledger`; saving the ledger is up to the
    /// caller.
    pub async fn extract(&self, ledger: &mut Ledger) -> Result<ExtractReport> {
        self.preflight_check(PipelineStage::Extract)?;
        fs::create_dir_all(&self.extract_path).await?;

        let mut report = ExtractReport::default();
        let archives = list_source_archives(&self.source_path).await?;
        if archives.is_empty() {
            log::warn!("No CBZ files found in {:?}", self.source_path);
            return Ok(report);
        }

        for archive in archives {
            let id = archive_id(&archive);
            let destination = self.extract_path.join(&id);

            if fs::try_exists(&destination).await? {
                log::info!("Skipping {} (already extracted)", get_file_name_lossy(&archive));
                report
                    .skipped
                    .push((id, SkipReason::AlreadyExtracted(destination)));
                continue;
            }

            log::info!(
                "Extracting {} -> {}",
                get_file_name_lossy(&archive),
                path_to_string_lossy(&destination)
            );
            match Self::extract_one(&archive, &destination).await {
                Ok(entries) => {
                    ledger.add(id.clone());
                    report.completed.push((
                        id,
                        ExtractedArchive {
                            source: archive,
                            destination,
                            entries,
                        },
                    ));
                }
                Err(e) => {
                    log::error!(
                        "Error extracting {}: {}. The CBZ file may be corrupted, skipping",
                        get_file_name_lossy(&archive),
                        e
                    );
                    report.failed.push((id, e));
                }
            }
        }

        log::info!(
            "Extraction complete: {} extracted, {} skipped, {} failed",
            report.completed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Organizes every archive listed in `ledger` into `output_path/<id>/Volume X/Chapter Y`.
    ///
    /// Archives without extraction directory or title index are skipped. Organizing is not
    /// repeatable: files are moved, so a second run finds nothing left to organize until the
    /// archive is extracted again.
    pub async fn organize(&self, ledger: &Ledger) -> Result<OrganizeReport> {
        let mut report = OrganizeReport::default();
        if ledger.is_empty() {
            log::warn!("No extracted archives found in the ledger");
            return Ok(report);
        }
        self.preflight_check(PipelineStage::Organize)?;
        log::info!("Found {} archive(s) to organize", ledger.len());

        for id in ledger.extracted() {
            let archive_root = self.extract_path.join(id);
            if !archive_root.is_dir() {
                log::warn!("Skipping {}: not found in {:?}", id, self.extract_path);
                report
                    .skipped
                    .push((id.clone(), SkipReason::NotExtracted(archive_root)));
                continue;
            }

            let index_path = archive_root.join(&self.index_file_name);
            if !index_path.is_file() {
                log::warn!("Skipping {}: title index not found at {:?}", id, index_path);
                report
                    .skipped
                    .push((id.clone(), SkipReason::MissingIndex(index_path)));
                continue;
            }

            log::info!("Organizing {}...", id);
            let output_root = self.output_path.join(id);
            match self
                .organize_archive(&archive_root, &index_path, &output_root)
                .await
            {
                Ok(materialized) => {
                    log::info!(
                        "{} organized: {} file(s), {} unmatched",
                        id,
                        materialized.total_moved(),
                        materialized.unmatched
                    );
                    if self.purge_extracted {
                        self.purge_extraction(&archive_root).await;
                    }
                    report.completed.push((id.clone(), materialized));
                }
                Err(e) => {
                    log::error!("Failed to organize {}: {}", id, e);
                    report.failed.push((id.clone(), e));
                }
            }
        }

        Ok(report)
    }

    /// Packages every organized title listed in `ledger` into per-chapter archives.
    ///
    /// See [`crate::packager::package_title`] for ordering and cleanup rules. A title whose
    /// chapters were already packaged has no images left and produces nothing.
    pub async fn package(&self, ledger: &Ledger) -> Result<PackageReport> {
        let mut report = PackageReport::default();
        if ledger.is_empty() {
            log::warn!("No extracted archives found in the ledger");
            return Ok(report);
        }
        self.preflight_check(PipelineStage::Package)?;
        log::info!("Found {} archive(s) to process", ledger.len());

        for id in ledger.extracted() {
            let title_dir = self.output_path.join(id);
            if !title_dir.is_dir() {
                log::warn!("Skipping {}: folder not found in {:?}", id, self.output_path);
                report
                    .skipped
                    .push((id.clone(), SkipReason::NotOrganized(title_dir)));
                continue;
            }

            log::info!("Creating CBZ files for {}...", id);
            match package_title(&title_dir).await {
                Ok(packaged) => {
                    log::info!(
                        "{} complete: {} archive(s), {} director(ies) removed",
                        id,
                        packaged.archives.len(),
                        packaged.removed_directories.len()
                    );
                    report.completed.push((id.clone(), packaged));
                }
                Err(e) => {
                    log::error!("Failed to package {}: {}", id, e);
                    report.failed.push((id.clone(), e));
                }
            }
        }

        Ok(report)
    }

    /// Runs extract, organize and package in order.
    ///
    /// Stage-level errors (such as a missing source directory) abort the run; per-archive
    /// failures are collected in the individual reports.
    pub async fn run(&self, ledger: &mut Ledger) -> Result<PipelineReport> {
        let extract = self.extract(ledger).await?;
        let organize = self.organize(ledger).await?;
        let package = self.package(ledger).await?;
        Ok(PipelineReport {
            extract,
            organize,
            package,
        })
    }

    // --- Private helpers ---

    async fn extract_one(archive: &Path, destination: &Path) -> Result<usize> {
        fs::create_dir_all(destination).await?;
        match extract_archive(archive, destination).await {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Leave nothing behind, or the next run would treat it as extracted.
                if let Err(cleanup) = fs::remove_dir_all(destination).await {
                    log::warn!(
                        "Could not remove partial extraction {:?}: {}",
                        destination,
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    async fn organize_archive(
        &self,
        archive_root: &Path,
        index_path: &Path,
        output_root: &Path,
    ) -> Result<MaterializeReport> {
        let index = TitleIndex::load(index_path).await?;

        let names: Vec<String> = collect_entries(archive_root, EntryKind::Any, true)
            .await?
            .iter()
            .map(|p| get_file_name_lossy(p))
            .collect();

        let classification = classify(&index, &names, &self.index_file_name)?;
        log::debug!(
            "{} file(s) classified into {} bucket(s)",
            classification.total_files(),
            classification.filled_buckets().count()
        );

        fs::create_dir_all(output_root).await?;
        materialize(archive_root, output_root, &classification).await
    }

    async fn purge_extraction(&self, archive_root: &Path) {
        match fs::remove_dir_all(archive_root).await {
            Ok(()) => log::info!("Removed {}/", path_to_string_lossy(archive_root)),
            Err(e) => log::warn!("Could not remove {:?}: {}", archive_root, e),
        }
    }
}

impl PagemasterConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let required = [
            ("source_path", &self.source_path),
            ("extract_path", &self.extract_path),
            ("output_path", &self.output_path),
        ];
        for (name, value) in required {
            if value.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
                return Err(format!("`{}` must be set", name));
            }
        }

        if let Some(name) = &self.index_file_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(format!("Invalid index_file_name: {:?}", name));
            }
        }

        Ok(())
    }
}
