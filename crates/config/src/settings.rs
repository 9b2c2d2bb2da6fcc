// Application settings
// Loaded from ~/.config/gridtalk/settings.json

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gridtalk_engine::{WriteLimits, DEFAULT_MAX_COL, DEFAULT_MAX_ROW};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("failed to write settings: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Data files
    #[serde(rename = "workbook.path")]
    pub workbook_path: PathBuf,

    #[serde(rename = "conversations.path")]
    pub conversations_path: PathBuf,

    // Read cache
    #[serde(rename = "cache.ttlSeconds")]
    pub cache_ttl_seconds: u64,

    // Write ceilings (zero-based indices)
    #[serde(rename = "limits.maxRow")]
    pub max_row: usize,

    #[serde(rename = "limits.maxCol")]
    pub max_col: usize,

    // Logging, in RUST_LOG syntax
    #[serde(rename = "log.filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from("data/example.xlsx"),
            conversations_path: PathBuf::from("data/chat.sqlite"),
            cache_ttl_seconds: 5,
            max_row: DEFAULT_MAX_ROW,
            max_col: DEFAULT_MAX_COL,
            log_filter: "info".to_string(),
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Data files (relative paths resolve against the working directory)
    "workbook.path": "data/example.xlsx",
    "conversations.path": "data/chat.sqlite",

    // Seconds a workbook snapshot may serve reads before reloading
    "cache.ttlSeconds": 5,

    // Writes beyond these zero-based indices are refused
    "limits.maxRow": 20000,
    "limits.maxCol": 1000,

    // Log filter, overridden by RUST_LOG
    "log.filter": "info"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridtalk")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults.
    /// A missing file is created with commented defaults.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::create_default_file(&path) {
                eprintln!("Error writing default settings.json: {}", e);
            }
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse JSON with `//` comment lines.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn create_default_file(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_FILE)?;
        Ok(())
    }

    pub fn limits(&self) -> WriteLimits {
        WriteLimits {
            max_row: self.max_row,
            max_col: self.max_col,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_matches_defaults() {
        assert_eq!(Settings::parse(DEFAULT_FILE).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"{
                // only the ceiling
                "limits.maxRow": 500
            }"#,
        )
        .unwrap();
        assert_eq!(settings.limits(), WriteLimits { max_row: 500, max_col: 1000 });
        assert_eq!(settings.cache_ttl(), Duration::from_secs(5));
        assert_eq!(settings.workbook_path, PathBuf::from("data/example.xlsx"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridtalk").join("settings.json");
        let settings = Settings {
            log_filter: "gridtalk=debug".into(),
            cache_ttl_seconds: 0,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("settings.json"));
    }
}
