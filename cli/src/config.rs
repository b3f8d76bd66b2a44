//! Optional TOML configuration file.
//!
//! Every key is optional and only provides a default; command-line flags
//! always win.
//!
//! ```toml
//! destination = "/photos"
//! duplicates = "/photos/duplicates"
//! mode = "move"
//! hash = "sha256"
//! preserve_duplicates = true
//! recursive = true
//! date_source = "exif"
//! ```

use mediasort_engine::{ChecksumAlgorithm, Mode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where a file's `YYYY-MM` folder comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    /// Capture date from EXIF or video metadata; non-media files are skipped
    #[default]
    Exif,
    /// File modification time; every file is accepted
    Mtime,
}

impl DateSource {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exif" => Some(Self::Exif),
            "mtime" => Some(Self::Mtime),
            _ => None,
        }
    }
}

/// Defaults read from the config file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Library root the `YYYY-MM` folders are created under
    pub destination: Option<PathBuf>,
    /// Directory confirmed duplicates are moved to
    pub duplicates: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub hash: Option<ChecksumAlgorithm>,
    pub preserve_duplicates: Option<bool>,
    pub recursive: Option<bool>,
    pub date_source: Option<DateSource>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load the config file at `path`.
pub fn load(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::parse(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
            destination = "/photos"
            duplicates = "/photos/dupes"
            mode = "move"
            hash = "blake3"
            preserve_duplicates = false
            recursive = true
            date_source = "mtime"
        "#;

        let config = FileConfig::parse(text, Path::new("mediasort.toml")).expect("Failed to parse config");
        assert_eq!(config.destination, Some(PathBuf::from("/photos")));
        assert_eq!(config.duplicates, Some(PathBuf::from("/photos/dupes")));
        assert_eq!(config.mode, Some(Mode::Move));
        assert_eq!(config.hash, Some(ChecksumAlgorithm::Blake3));
        assert_eq!(config.preserve_duplicates, Some(false));
        assert_eq!(config.recursive, Some(true));
        assert_eq!(config.date_source, Some(DateSource::Mtime));
    }

    #[test]
    fn test_date_source_from_str() {
        assert_eq!(DateSource::from_str("EXIF"), Some(DateSource::Exif));
        assert_eq!(DateSource::from_str("mtime"), Some(DateSource::Mtime));
        assert_eq!(DateSource::from_str("filename"), None);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = FileConfig::parse("", Path::new("mediasort.toml")).expect("Failed to parse config");
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let result = FileConfig::parse("mode = \"link\"", Path::new("mediasort.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let result = FileConfig::parse("overwrite = true", Path::new("mediasort.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new("/nonexistent/mediasort.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("mediasort.toml");
        std::fs::write(&path, "hash = \"sha256\"\n").expect("Failed to write config");

        let config = load(&path).expect("Failed to load config");
        assert_eq!(config.hash, Some(ChecksumAlgorithm::Sha256));
        assert_eq!(config.mode, None);
    }
}
