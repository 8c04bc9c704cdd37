use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the overlay tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Output placement and notification settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Directory the overlay output is written to
    pub fn scratch_dir(&self) -> PathBuf {
        self.output
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

const LOG_LEVELS: &[&str] = &[
    "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
];

/// Settings for the FFmpeg process engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// FFmpeg executable (name on PATH or absolute path)
    pub ffmpeg_binary: PathBuf,

    /// Value passed to `-loglevel`; `None` keeps FFmpeg's default
    pub log_level: Option<String>,

    /// Forward every engine log line to tracing
    pub log_engine_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            log_level: None,
            log_engine_output: true,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg_binary.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "engine.ffmpeg_binary".to_string(),
                value: String::new(),
            }.into());
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "engine.log_level".to_string(),
                    value: level.clone(),
                }.into());
            }
        }

        Ok(())
    }
}

/// Where results go and which notifications are delivered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Scratch directory for results; the system temp dir when unset
    pub scratch_dir: Option<PathBuf>,

    /// Relay engine statistics to the delegate as progress updates
    pub forward_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            forward_progress: true,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.scratch_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "output.scratch_dir".to_string(),
                    value: String::new(),
                }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scratch_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.engine.log_level = Some("error".to_string());
        original_config.output.scratch_dir = Some(dir.path().join("scratch"));

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.engine.log_level.as_deref(), Some("error"));
        assert_eq!(loaded_config.scratch_dir(), dir.path().join("scratch"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[output]\nforward_progress = false\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert!(!config.output.forward_progress);
        assert_eq!(config.engine.ffmpeg_binary, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.engine.log_level = Some("chatty".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.user_message().contains("not found"));
    }
}
