use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::DEFAULT_REFRESH_INTERVAL;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`.
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "reposync=debug",
            LogLevel::Info => "reposync=info",
            LogLevel::Warn => "reposync=warn",
            LogLevel::Error => "reposync=error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_git_binary")]
    pub git_binary: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub refresh_on_focus: bool,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_git_binary() -> String {
    "git".to_string()
}

fn default_command_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
            remote: default_remote(),
            git_binary: default_git_binary(),
            command_timeout_secs: default_command_timeout(),
            refresh_on_focus: default_true(),
        }
    }
}

impl SyncConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// `None` when the timeout is disabled (0).
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Project id → working-copy path
    #[serde(default)]
    pub projects: BTreeMap<String, PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".reposync");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("reposync.log"))
    }

    pub fn ensure_config_dir() -> Result<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            std::fs::create_dir_all(&dir).context("Failed to create config directory")?;
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sync.refresh_secs, 30);
        assert_eq!(config.sync.remote, "origin");
        assert_eq!(config.sync.git_binary, "git");
        assert!(config.sync.refresh_on_focus);
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.projects.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            refresh_secs = 10
            command_timeout_secs = 0

            [log]
            level = "debug"

            [projects]
            widgets = "/work/widgets"
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.sync.command_timeout(), None);
        assert_eq!(config.sync.remote, "origin");
        assert_eq!(config.log.level.directive(), "reposync=debug");
        assert_eq!(
            config.projects.get("widgets"),
            Some(&PathBuf::from("/work/widgets"))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sync]\nremote = \"upstream\"\n\n[projects]\napi = \"/work/api\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sync.remote, "upstream");
        assert_eq!(loaded.sync.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
        assert_eq!(loaded.projects.len(), 1);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.sync.refresh_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nrefresh_secs = \"soon\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
