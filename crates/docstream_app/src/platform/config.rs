use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use docstream_core::{SessionConfig, DEFAULT_MAX_FILES};
use docstream_engine::UploadSettings;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "docstream.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub endpoint: String,
    pub max_files: usize,
    pub roster_capacity: usize,
    pub success_message_ttl_secs: u64,
    pub connect_timeout_secs: u64,
    pub file_field: String,
    pub prompt_field: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let upload = UploadSettings::default();
        Self {
            endpoint: upload.endpoint,
            max_files: DEFAULT_MAX_FILES,
            roster_capacity: DEFAULT_MAX_FILES * 2,
            success_message_ttl_secs: 5,
            connect_timeout_secs: upload.connect_timeout.as_secs(),
            file_field: upload.file_field,
            prompt_field: upload.prompt_field,
            log_level: "info".to_string(),
        }
    }
}

/// Result of looking for a config file.
#[derive(Debug)]
pub(crate) enum LoadedConfig {
    Found(AppConfig),
    Missing,
    /// The file exists but could not be parsed; defaults apply.
    Invalid { path: PathBuf, reason: String },
}

impl LoadedConfig {
    pub fn into_config(self) -> AppConfig {
        match self {
            LoadedConfig::Found(config) => config,
            LoadedConfig::Missing | LoadedConfig::Invalid { .. } => AppConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path` if it exists. Only an unreadable file is an error.
    pub fn load(path: &Path) -> anyhow::Result<LoadedConfig> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedConfig::Missing);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };

        Ok(match ron::from_str::<AppConfig>(&content) {
            Ok(config) => LoadedConfig::Found(config),
            Err(err) => LoadedConfig::Invalid {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })
    }

    pub fn log_level(&self, verbose: bool) -> LevelFilter {
        if verbose {
            return LevelFilter::Debug;
        }
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_files: self.max_files,
            roster_capacity: self.roster_capacity.max(self.max_files),
            success_message_ttl: Duration::from_secs(self.success_message_ttl_secs),
        }
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            endpoint: self.endpoint.clone(),
            file_field: self.file_field.clone(),
            prompt_field: self.prompt_field.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let loaded = AppConfig::load(&dir.path().join(DEFAULT_CONFIG_FILENAME)).unwrap();
        assert!(matches!(loaded, LoadedConfig::Missing));
        assert_eq!(loaded.into_config(), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(endpoint: "http://10.0.0.5:8080/upload", max_files: 4)"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap().into_config();

        assert_eq!(config.endpoint, "http://10.0.0.5:8080/upload");
        assert_eq!(config.max_files, 4);
        assert_eq!(config.file_field, "files");
        assert_eq!(config.session_config().max_files, 4);
        assert_eq!(config.upload_settings().connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "(max_files: \"ten\"").unwrap();

        let loaded = AppConfig::load(&path).unwrap();

        assert!(matches!(loaded, LoadedConfig::Invalid { .. }));
        assert_eq!(loaded.into_config(), AppConfig::default());
    }

    #[test]
    fn verbose_overrides_configured_level() {
        let config = AppConfig {
            log_level: "warn".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_level(false), LevelFilter::Warn);
        assert_eq!(config.log_level(true), LevelFilter::Debug);
        let bogus = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(bogus.log_level(false), LevelFilter::Info);
    }
}
