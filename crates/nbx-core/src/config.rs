use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of download attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/nbx/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbxConfig {
    /// Connect timeout for the tarball download, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout for the tarball download, in seconds.
    pub transfer_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional download cap in bytes per second (None = no cap).
    #[serde(default)]
    pub max_recv_speed: Option<u64>,
    /// Extra arguments appended to every `pip install` (e.g. a proxy or trusted host).
    #[serde(default)]
    pub pip_extra_args: Vec<String>,
}

impl Default for NbxConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            retry: None,
            max_recv_speed: None,
            pip_extra_args: Vec::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("nbx")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Parse a config file at an explicit path.
pub fn load_from_path(path: &Path) -> Result<NbxConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: NbxConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<NbxConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = NbxConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = NbxConfig::default();
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.transfer_timeout_secs, 3600);
        assert!(cfg.retry.is_none());
        assert!(cfg.pip_extra_args.is_empty());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = NbxConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: NbxConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.connect_timeout_secs, cfg.connect_timeout_secs);
        assert_eq!(parsed.transfer_timeout_secs, cfg.transfer_timeout_secs);
    }

    #[test]
    fn config_toml_retry_and_pip_args() {
        let toml = r#"
            connect_timeout_secs = 10
            transfer_timeout_secs = 600
            max_recv_speed = 1_000_000
            pip_extra_args = ["--proxy", "http://proxy:3128"]

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: NbxConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.max_recv_speed, Some(1_000_000));
        assert_eq!(cfg.pip_extra_args, vec!["--proxy", "http://proxy:3128"]);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }

    #[test]
    fn load_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "connect_timeout_secs = \"soon\"").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config"));
    }
}
