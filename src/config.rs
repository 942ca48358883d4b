//! Configuration file handling.
//!
//! Settings come from `space-dashboard.toml` (or `--config`), and flags
//! given on the command line take precedence.

use crate::cli::{Args, Command};
use crate::error::ConfigError;
use crate::loader::LabelLocale;
use crate::narrative::DEFAULT_TITLE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "space-dashboard.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Mission dataset (CSV).
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub label_locale: LabelLocale,

    /// Rows shown in the sample-data viewer.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            label_locale: LabelLocale::default(),
            sample_rows: default_sample_rows(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/Global_Space_Exploration_Dataset.csv")
}

fn default_sample_rows() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory for reports written by the `report` command.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `Ok(None)` when `dir` has no config file.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// CLI flags override file settings only when given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(data) = args.data_args() {
            if let Some(ref path) = data.data {
                self.data.path = path.clone();
            }
            if let Some(locale) = data.locale {
                self.data.label_locale = locale.into();
            }
        }
        match &args.command {
            Command::Serve { bind: Some(bind), .. } => self.server.bind = bind.clone(),
            Command::Report { title: Some(title), .. } => self.report.title = title.clone(),
            _ => {}
        }
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.data.sample_rows, 5);
        assert_eq!(config.data.label_locale, LabelLocale::En);
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.report.title, DEFAULT_TITLE);
    }

    #[test]
    fn parse_partial_config() {
        let toml_content = r#"
[data]
path = "missions.csv"
label_locale = "pt"

[server]
bind = "0.0.0.0:8080"
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, PathBuf::from("missions.csv"));
        assert_eq!(config.data.label_locale, LabelLocale::Pt);
        assert_eq!(config.data.sample_rows, 5);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.report, ReportConfig::default());
    }

    #[test]
    fn default_toml_round_trips() {
        let text = Config::default_toml();
        assert!(text.contains("[data]"));
        assert!(text.contains("[server]"));
        assert!(text.contains("[report]"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn args_override_only_given_values() {
        let mut config = Config::default();
        config.server.bind = "10.0.0.1:1".to_string();
        let args = Args::try_parse_from(["space-dashboard", "serve", "--data", "x.csv"]).unwrap();
        config.merge_with_args(&args);
        assert_eq!(config.data.path, PathBuf::from("x.csv"));
        assert_eq!(config.server.bind, "10.0.0.1:1");

        let args = Args::try_parse_from(["space-dashboard", "report", "--title", "Orbit"]).unwrap();
        config.merge_with_args(&args);
        assert_eq!(config.report.title, "Orbit");
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[data\npath = 3").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn load_from_dir_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\ntitle = \"T\"\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.title, "T");
    }
}
