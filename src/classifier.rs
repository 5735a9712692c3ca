//! Chapter classification of extracted archive contents.
//!
//! Given the flat list of names found in an extraction directory and the title index that
//! came with it, the classifier decides which volume/chapter bucket every name belongs to.
//! It never touches the file system; [`crate::materializer`] performs the moves.
//!
//! Processing order is fixed:
//! 1. chapters are grouped by their coalesced volume label, volumes in first-seen order
//!    ([`VolumeOrder::FirstSeen`]);
//! 2. inside a volume, chapters are sorted by [`ChapterNumber::total_cmp`] (stable);
//! 3. each chapter claims every remaining name whose base name matches its pattern at the
//!    start; the first claim wins;
//! 4. whatever is left goes to the fallback bucket `Volume 1/Chapter 001`.

use std::collections::HashMap;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::path_utils::{base_name, sanitize_filename};
use crate::types::{ChapterDescriptor, DEFAULT_VOLUME, TitleIndex};

/// Chapter label of the bucket that receives unmatched files.
pub const FALLBACK_CHAPTER: &str = "001";

lazy_static! {
    /// Extracts a chapter label from a display name.
    /// Matches "Ch.14.5", "Ch 3", "Chapter 12" etc; case-sensitive, ASCII digits only.
    pub static ref CHAPTER_LABEL_REGEX: Regex =
        Regex::new(r"(?:Ch\.?\s*|Chapter\s*)([0-9]+(?:\.[0-9]+)?)").unwrap();
}

/// Order in which volume groups are processed.
///
/// Only `FirstSeen` exists: volumes are processed in the order their label first appears in
/// the index, not in sorted order. Output reproducibility (log order, bucket order, claim
/// precedence between volumes) depends on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeOrder {
    #[default]
    FirstSeen,
}

/// Identifies a destination directory pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub volume: String,
    pub chapter: String,
}

impl BucketKey {
    pub fn new(volume: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            volume: volume.into(),
            chapter: chapter.into(),
        }
    }

    /// The fixed bucket for files no chapter claimed.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_VOLUME, FALLBACK_CHAPTER)
    }

    pub fn volume_dir(&self) -> String {
        sanitize_filename(&format!("Volume {}", self.volume))
    }

    pub fn chapter_dir(&self) -> String {
        sanitize_filename(&format!("Chapter {}", self.chapter))
    }

    /// `Volume X/Chapter Y`, relative to a title's output directory.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.volume_dir()).join(self.chapter_dir())
    }
}

/// A bucket and the names it claimed, in the sorted order of the input set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBucket {
    pub key: BucketKey,
    /// Chapter id from the index; `None` for the fallback bucket.
    pub chapter_id: Option<String>,
    pub files: Vec<String>,
}

impl ChapterBucket {
    pub fn is_fallback(&self) -> bool {
        self.chapter_id.is_none()
    }
}

/// Full result of classifying one archive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// Every chapter bucket in processing order, empty ones included, fallback last.
    pub buckets: Vec<ChapterBucket>,
}

impl Classification {
    /// Buckets that received at least one file, in processing order.
    pub fn filled_buckets(&self) -> impl Iterator<Item = &ChapterBucket> {
        self.buckets.iter().filter(|b| !b.files.is_empty())
    }

    /// Maps every classified name to its bucket.
    pub fn assignment(&self) -> HashMap<&str, &BucketKey> {
        self.buckets
            .iter()
            .flat_map(|b| b.files.iter().map(move |f| (f.as_str(), &b.key)))
            .collect()
    }

    pub fn fallback(&self) -> Option<&ChapterBucket> {
        self.buckets.last().filter(|b| b.is_fallback())
    }

    pub fn unmatched_count(&self) -> usize {
        self.fallback().map_or(0, |b| b.files.len())
    }

    pub fn total_files(&self) -> usize {
        self.buckets.iter().map(|b| b.files.len()).sum()
    }
}

/// A compiled chapter membership pattern.
///
/// The index over-escapes its patterns: every `\\` in the source stands for a single `\`.
/// The normalized source is compiled anchored at the start of the base name, so `003_`
/// matches `003_001` but not `x003_001`, while trailing text is allowed.
#[derive(Debug, Clone)]
pub struct ChapterPattern {
    source: String,
    regex: Regex,
}

impl ChapterPattern {
    /// Collapses doubled backslashes into single ones.
    pub fn normalize(raw: &str) -> String {
        raw.replace(r"\\", r"\")
    }

    pub fn compile(raw: &str) -> std::result::Result<Self, regex::Error> {
        let source = Self::normalize(raw);
        let regex = Regex::new(&format!("^(?:{})", source))?;
        Ok(Self { source, regex })
    }

    /// The normalized pattern source, before anchoring.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the base name of `file_name` starts with a match.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(base_name(file_name))
    }
}

/// Derives the display chapter label of a descriptor.
///
/// The numeric text following `Ch`, `Ch.` or `Chapter` in the name wins; otherwise the
/// `number` field is used verbatim.
pub fn chapter_label(descriptor: &ChapterDescriptor) -> String {
    CHAPTER_LABEL_REGEX
        .captures(descriptor.name())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| descriptor.number.to_string())
}

/// Groups the index chapters into volumes following `order`, each volume sorted by number.
pub fn group_volumes(
    index: &TitleIndex,
    order: VolumeOrder,
) -> Vec<(String, Vec<(&str, &ChapterDescriptor)>)> {
    let mut volumes: Vec<(String, Vec<(&str, &ChapterDescriptor)>)> = Vec::new();

    match order {
        VolumeOrder::FirstSeen => {
            for (id, descriptor) in &index.chapters {
                let label = descriptor.volume_label();
                match volumes.iter_mut().find(|(v, _)| *v == label) {
                    Some((_, chapters)) => chapters.push((id.as_str(), descriptor)),
                    None => volumes.push((label, vec![(id.as_str(), descriptor)])),
                }
            }
        }
    }

    for (_, chapters) in volumes.iter_mut() {
        chapters.sort_by(|a, b| a.1.number.total_cmp(&b.1.number));
    }
    volumes
}

/// Classifies `file_names` against the chapters of `index`.
///
/// # Arguments
///
/// * `index` - The title index of the archive
/// * `file_names` - Names found in the extraction directory; sorted and deduplicated here
/// * `index_file` - Name of the index file, never a candidate
///
/// # Returns
///
/// * `Ok(Classification)` - A partition of the candidate names
/// * `Err(Error::InvalidPattern)` - A chapter pattern failed to compile; nothing is claimed
pub fn classify<S: AsRef<str>>(
    index: &TitleIndex,
    file_names: &[S],
    index_file: &str,
) -> Result<Classification> {
    let volumes = group_volumes(index, VolumeOrder::default());

    // Compile everything up front so a bad pattern fails the archive before any claim.
    let mut plan: Vec<(BucketKey, &str, ChapterPattern)> = Vec::new();
    for (volume, chapters) in &volumes {
        for (id, descriptor) in chapters {
            let pattern = ChapterPattern::compile(&descriptor.entries).map_err(|source| {
                Error::InvalidPattern {
                    chapter: id.to_string(),
                    pattern: descriptor.entries.clone(),
                    source,
                }
            })?;
            plan.push((
                BucketKey::new(volume.clone(), chapter_label(descriptor)),
                *id,
                pattern,
            ));
        }
    }

    let mut remaining: Vec<String> = file_names
        .iter()
        .map(|f| f.as_ref().to_string())
        .filter(|f| f != index_file)
        .collect();
    remaining.sort();
    remaining.dedup();

    let mut buckets = Vec::with_capacity(plan.len() + 1);
    for (key, id, pattern) in plan {
        let (claimed, rest): (Vec<String>, Vec<String>) =
            remaining.into_iter().partition(|f| pattern.matches(f));
        remaining = rest;
        log::trace!(
            "chapter '{}' ({:?}) claimed {} file(s) with pattern {:?}",
            id,
            key,
            claimed.len(),
            pattern.source()
        );
        buckets.push(ChapterBucket {
            key,
            chapter_id: Some(id.to_string()),
            files: claimed,
        });
    }

    if !remaining.is_empty() {
        buckets.push(ChapterBucket {
            key: BucketKey::fallback(),
            chapter_id: None,
            files: remaining,
        });
    }

    Ok(Classification { buckets })
}
