//! Persisted directory settings (`config.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;
use crate::pagemaster::PagemasterConfig;

/// Default file name of the settings file.
pub const DEFAULT_SETTINGS_FILE: &str = "config.json";

/// The three directories the pipeline works with.
///
/// Older settings files used upper-case keys (`SOURCE_DIR`, ...); both spellings are read,
/// the snake case one is written. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the source `.cbz` archives.
    #[serde(alias = "SOURCE_DIR")]
    pub source_directory: String,
    /// Scratch directory receiving extracted archives.
    #[serde(alias = "EXTRACT_DIR")]
    pub extract_directory: String,
    /// Final organized tree.
    #[serde(alias = "OUTPUT_DIR")]
    pub output_directory: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_directory: "Manga".to_string(),
            extract_directory: "extracted".to_string(),
            output_directory: "organized".to_string(),
        }
    }
}

impl Settings {
    /// Loads the settings at `path`; `Ok(None)` when the file does not exist.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, text).await?;
        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Builds the runtime configuration for these directories.
    pub fn to_config(&self) -> Result<PagemasterConfig> {
        Ok(PagemasterConfig::builder()
            .source_path(PathBuf::from(&self.source_directory))
            .extract_path(PathBuf::from(&self.extract_directory))
            .output_path(PathBuf::from(&self.output_directory))
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{"SOURCE_DIR": "in", "EXTRACT_DIR": "tmp", "OUTPUT_DIR": "out"}"#,
        )
        .unwrap();
        assert_eq!(settings.source_directory, "in");
        assert_eq!(settings.extract_directory, "tmp");
        assert_eq!(settings.output_directory, "out");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"source_directory": "in"}"#).unwrap();
        assert_eq!(settings.source_directory, "in");
        assert_eq!(settings.extract_directory, "extracted");
        assert_eq!(settings.output_directory, "organized");
    }

    #[test]
    fn test_to_config() {
        let config = Settings::default().to_config().unwrap();
        assert_eq!(config.source_path, PathBuf::from("Manga"));
        assert_eq!(config.index_file_name, "index.json");
    }

    #[test]
    fn test_to_config_rejects_empty_directory() {
        let settings = Settings {
            output_directory: String::new(),
            ..Default::default()
        };
        assert!(settings.to_config().is_err());
    }
}
