use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use std::fs;
use crate::monitor::MonitorSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_printer")]
    pub printer: String,
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_enum_max_jobs")]
    pub enum_max_jobs: u32,
}

fn default_printer() -> String { common::DEFAULT_PRINTER.to_string() }
fn default_wait_timeout() -> u64 { common::DEFAULT_WAIT_TIMEOUT_MS }
fn default_enum_max_jobs() -> u32 { common::DEFAULT_ENUM_MAX_JOBS }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            printer: default_printer(),
            wait_timeout_ms: default_wait_timeout(),
            enum_max_jobs: default_enum_max_jobs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Defaults to `~/PrintedLogs`.
    pub dir: Option<PathBuf>,
    #[serde(default = "default_capture")]
    pub capture: bool,
}

fn default_capture() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            capture: default_capture(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub autostart: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }
    }

    /// Directory for the print log and captures.
    pub fn output_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output.dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(common::LOG_DIR_NAME))
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            printer_name: self.monitor.printer.clone(),
            wait_timeout: Duration::from_millis(self.monitor.wait_timeout_ms),
            enum_max_jobs: self.monitor.enum_max_jobs,
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let settings = config.monitor_settings();
        assert_eq!(settings.printer_name, "Foxit PDF Editor Printer");
        assert_eq!(settings.wait_timeout, Duration::from_secs(2));
        assert_eq!(settings.enum_max_jobs, 10);
        assert!(config.output.capture);
        assert!(!config.autostart);
        assert!(config.output_dir().unwrap().ends_with("PrintedLogs"));
    }

    #[test]
    fn test_yaml_partial() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("printwatch.yaml");
        fs::write(&path, "monitor:\n  printer: LP1\noutput:\n  capture: false\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.monitor.printer, "LP1");
        assert_eq!(config.monitor.wait_timeout_ms, 2000);
        assert!(!config.output.capture);
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_toml() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("printwatch.toml");
        fs::write(
            &path,
            "autostart = true\n[monitor]\nwait_timeout_ms = 500\n[output]\ndir = \"/tmp/prints\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.autostart);
        assert_eq!(config.monitor_settings().wait_timeout, Duration::from_millis(500));
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("/tmp/prints"));
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_extension() {
        assert!(Config::from_file(&PathBuf::from("printwatch.ini")).is_err());
    }
}
