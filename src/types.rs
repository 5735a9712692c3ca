//! Core data types, enums, and reports for the Pagemaster pipeline.
//!
//! This module defines the fundamental data structures used throughout Pagemaster:
//! - The per-title metadata index (`TitleIndex`, `ChapterDescriptor`, `ChapterNumber`)
//! - Pipeline stage selection (`PipelineStage`)
//! - Reporting types (`StageReport`, `SkipReason`, `MaterializeReport`, `PackagedTitle`)
//! - The packaged image extensions (`is_supported_image`)

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::has_extension;

/// Volume label used when a chapter has no (or a falsy) volume.
pub const DEFAULT_VOLUME: &str = "1";

/// File name of the title index inside every extraction directory.
pub const DEFAULT_INDEX_FILE: &str = "index.json";

/// Per-title metadata index shipped inside each source archive.
///
/// The `chapters` map is kept as an ordered list: the order in which chapter ids appear in
/// the document decides the order in which volumes are first seen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleIndex {
    #[serde(deserialize_with = "ordered_chapters")]
    pub chapters: Vec<(String, ChapterDescriptor)>,
}

impl TitleIndex {
    /// Parses an index from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses the index file at `path`.
    ///
    /// A missing file surfaces as [`Error::Io`] with `NotFound`; malformed JSON is reported as
    /// [`Error::InvalidIndex`] carrying the path.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidIndex(path.to_path_buf(), e.to_string()))
    }
}

fn ordered_chapters<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, ChapterDescriptor)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ChaptersVisitor;

    impl<'de> Visitor<'de> for ChaptersVisitor {
        type Value = Vec<(String, ChapterDescriptor)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of chapter id to chapter descriptor")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut chapters: Self::Value = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, descriptor)) = map.next_entry::<String, ChapterDescriptor>()? {
                // A repeated id replaces the earlier value but keeps its position.
                match chapters.iter_mut().find(|(existing, _)| *existing == id) {
                    Some((_, slot)) => *slot = descriptor,
                    None => chapters.push((id, descriptor)),
                }
            }
            Ok(chapters)
        }
    }

    deserializer.deserialize_map(ChaptersVisitor)
}

/// One chapter of a title as described by the index.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterDescriptor {
    /// Volume identifier; null, `false`, `0` or `""` all mean the default volume.
    #[serde(default)]
    pub volume: Option<Value>,
    /// Ordering key within the volume.
    pub number: ChapterNumber,
    /// Display name, possibly embedding a label such as `Ch. 14.5`.
    #[serde(default)]
    pub name: Option<String>,
    /// Regex source matched against the start of each file's base name.
    pub entries: String,
}

impl ChapterDescriptor {
    /// Coalesced volume label used both as grouping key and in the `Volume {label}` directory.
    pub fn volume_label(&self) -> String {
        match &self.volume {
            None | Some(Value::Null) | Some(Value::Bool(false)) => DEFAULT_VOLUME.to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => DEFAULT_VOLUME.to_string(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => DEFAULT_VOLUME.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Chapter ordering key: JSON numbers and strings are both accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ChapterNumber {
    Numeric(serde_json::Number),
    Text(String),
}

impl ChapterNumber {
    /// Numeric value when the key is a number or a string that parses as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChapterNumber::Numeric(n) => n.as_f64(),
            ChapterNumber::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }

    /// Total order over mixed keys: numeric values first (compared numerically), then
    /// non-numeric strings (compared lexically).
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterNumber::Numeric(n) => write!(f, "{}", n),
            ChapterNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Selects which stage a [`crate::PagemasterConfig::preflight_check`] validates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Source archives are extracted into the extraction directory.
    Extract,
    /// Extracted images are sorted into volume/chapter directories.
    Organize,
    /// Chapter directories are zipped into per-chapter archives.
    Package,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Extract => f.write_str("extract"),
            PipelineStage::Organize => f.write_str("organize"),
            PipelineStage::Package => f.write_str("package"),
        }
    }
}

/// Why a stage passed over an archive without treating it as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The extraction directory already exists.
    AlreadyExtracted(PathBuf),
    /// The ledger lists the archive but its extraction directory is gone.
    NotExtracted(PathBuf),
    /// No title index inside the extraction directory.
    MissingIndex(PathBuf),
    /// The ledger lists the archive but nothing was organized for it.
    NotOrganized(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyExtracted(p) => write!(f, "already extracted to {:?}", p),
            SkipReason::NotExtracted(p) => write!(f, "extraction directory {:?} not found", p),
            SkipReason::MissingIndex(p) => write!(f, "title index not found at {:?}", p),
            SkipReason::NotOrganized(p) => write!(f, "organized directory {:?} not found", p),
        }
    }
}

/// Outcome of one stage run, keyed by archive identifier.
#[derive(Debug)]
pub struct StageReport<T> {
    pub completed: Vec<(String, T)>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, Error)>,
}

impl<T> Default for StageReport<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> StageReport<T> {
    /// True when no archive failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn completed_ids(&self) -> Vec<&str> {
        self.completed.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn skipped_ids(&self) -> Vec<&str> {
        self.skipped.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|(id, _)| id.as_str()).collect()
    }
}

/// Result of extracting one source archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArchive {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub entries: usize,
}

/// Files moved into one chapter directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketMove {
    pub destination: PathBuf,
    pub files: usize,
    pub fallback: bool,
}

/// Report from relocating one archive's files into its volume/chapter layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// One entry per bucket, in processing order (empty chapter buckets included).
    pub moves: Vec<BucketMove>,
    /// Number of files routed to the fallback bucket.
    pub unmatched: usize,
}

impl MaterializeReport {
    pub fn total_moved(&self) -> usize {
        self.moves.iter().map(|m| m.files).sum()
    }
}

/// Result of packaging one organized title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagedTitle {
    /// Archives written, in volume/chapter order.
    pub archives: Vec<PathBuf>,
    /// Directories deleted during cleanup.
    pub removed_directories: Vec<PathBuf>,
}

pub type ExtractReport = StageReport<ExtractedArchive>;
pub type OrganizeReport = StageReport<MaterializeReport>;
pub type PackageReport = StageReport<PackagedTitle>;

/// Reports of a full extract → organize → package run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub extract: ExtractReport,
    pub organize: OrganizeReport,
    pub package: PackageReport,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.extract.is_clean() && self.organize.is_clean() && self.package.is_clean()
    }
}

/// Image extensions that are packaged, lower case.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// True when the path carries one of [`IMAGE_EXTENSIONS`], compared case-insensitively.
pub fn is_supported_image(path: &Path) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: &str) -> ChapterDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_index_keeps_document_order() {
        let index = TitleIndex::from_json(
            r#"{"chapters": {
                "z": {"volume": 2, "number": 1, "name": "", "entries": "a"},
                "a": {"volume": 1, "number": 1, "name": "", "entries": "b"}
            }}"#,
        )
        .unwrap();
        let ids: Vec<&str> = index.chapters.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn test_repeated_chapter_id_keeps_last_value_at_first_position() {
        let index = TitleIndex::from_json(
            r#"{"chapters": {
                "c1": {"number": 1, "entries": "a"},
                "c2": {"number": 2, "entries": "c"},
                "c1": {"number": 1, "entries": "b"}
            }}"#,
        )
        .unwrap();
        let chapters: Vec<(&str, &str)> = index
            .chapters
            .iter()
            .map(|(id, d)| (id.as_str(), d.entries.as_str()))
            .collect();
        assert_eq!(chapters, vec![("c1", "b"), ("c2", "c")]);
    }

    #[test]
    fn test_index_requires_chapters() {
        assert!(TitleIndex::from_json(r#"{"title": "x"}"#).is_err());
    }

    #[test]
    fn test_volume_label_coalesces_falsy_values() {
        for volume in ["null", "false", "0", "\"\"", "0.0"] {
            let d = descriptor(&format!(
                r#"{{"volume": {}, "number": 1, "entries": "x"}}"#,
                volume
            ));
            assert_eq!(d.volume_label(), "1", "volume {}", volume);
        }
        let missing = descriptor(r#"{"number": 1, "entries": "x"}"#);
        assert_eq!(missing.volume_label(), "1");

        let numeric = descriptor(r#"{"volume": 3, "number": 1, "entries": "x"}"#);
        assert_eq!(numeric.volume_label(), "3");
        let text = descriptor(r#"{"volume": "2", "number": 1, "entries": "x"}"#);
        assert_eq!(text.volume_label(), "2");
    }

    #[test]
    fn test_chapter_number_display_is_verbatim() {
        let d = descriptor(r#"{"number": 7, "entries": "x"}"#);
        assert_eq!(d.number.to_string(), "7");
        let d = descriptor(r#"{"number": 7.5, "entries": "x"}"#);
        assert_eq!(d.number.to_string(), "7.5");
        let d = descriptor(r#"{"number": "007", "entries": "x"}"#);
        assert_eq!(d.number.to_string(), "007");
    }

    #[test]
    fn test_chapter_number_total_order() {
        let n = |json: &str| -> ChapterNumber { serde_json::from_str(json).unwrap() };

        assert_eq!(n("2").total_cmp(&n("10")), Ordering::Less);
        assert_eq!(n("\"10\"").total_cmp(&n("9")), Ordering::Greater);
        assert_eq!(n("\"2.5\"").total_cmp(&n("2.5")), Ordering::Equal);
        assert_eq!(n("100").total_cmp(&n("\"extra\"")), Ordering::Less);
        assert_eq!(n("\"b\"").total_cmp(&n("\"a\"")), Ordering::Greater);
        assert_eq!(n("\"NaN\"").total_cmp(&n("1")), Ordering::Greater);
    }

    #[test]
    fn test_null_number_is_rejected() {
        let result = serde_json::from_str::<ChapterDescriptor>(r#"{"number": null, "entries": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("a/001.JPG")));
        assert!(is_supported_image(Path::new("002.jpeg")));
        assert!(is_supported_image(Path::new("003.WebP")));
        assert!(is_supported_image(Path::new("p.png")));
        assert!(!is_supported_image(Path::new("index.json")));
        assert!(!is_supported_image(Path::new("noext")));
        assert!(!is_supported_image(Path::new("jpg")));
    }
}
