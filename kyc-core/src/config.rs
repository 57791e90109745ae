//! Wizard configuration.
//!
//! Read from a TOML file when one is given (or `kyc-wizard.toml` exists in the
//! working directory), otherwise defaults. CLI flags are layered on top with
//! [`KycConfig::apply_overrides`].

use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "kyc-wizard.toml";
pub const DEFAULT_COMPLETION_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KycConfig {
    pub backend: BackendConfig,
    pub camera: CameraConfig,
    pub flow: FlowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub token: String,
    pub liveness_server_key: String,
    pub document_server_key: String,
    pub ocr_server_key: String,
    pub scan_server_key: String,
    pub tenant_name: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            token: String::new(),
            liveness_server_key: String::new(),
            document_server_key: String::new(),
            ocr_server_key: String::new(),
            scan_server_key: String::new(),
            tenant_name: String::new(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    /// Parsed base URL, normalised to end with `/` so endpoint joins append
    /// rather than replace the last path segment.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url =
            Url::parse(&raw).with_context(|| format!("Invalid backend base_url: {}", raw))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("backend base_url must be http(s): {}", raw);
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub frames_dir: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Replaces the built-in country/document table when set.
    pub reference_data: Option<PathBuf>,
    pub report_dir: PathBuf,
    pub completion_delay_ms: u64,
    pub log_file: PathBuf,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            reference_data: None,
            report_dir: PathBuf::from("."),
            completion_delay_ms: DEFAULT_COMPLETION_DELAY_MS,
            log_file: PathBuf::from("kyc-wizard.log"),
        }
    }
}

impl KycConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KycConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit paths must exist; without one, the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    log::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.backend.base_url()?;
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, cli: &Cli) -> Result<()> {
        if let Some(ref base_url) = cli.base_url {
            self.backend.base_url = base_url.clone();
        }
        if let Some(ref frames_dir) = cli.frames_dir {
            self.camera.frames_dir = frames_dir.clone();
        }
        if let Some(ref reference_data) = cli.reference_data {
            self.flow.reference_data = Some(reference_data.clone());
        }
        if let Some(ref report_dir) = cli.report_dir {
            self.flow.report_dir = report_dir.clone();
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn empty_file_yields_defaults() {
        let config = KycConfig::from_toml_str("").unwrap();
        assert_eq!(config, KycConfig::default());
        assert_eq!(config.flow.completion_delay_ms, 3000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = KycConfig::from_toml_str(
            r#"
[backend]
base_url = "https://kyc.example.com/api"
token = "secret"

[flow]
completion_delay_ms = 500
"#,
        )
        .unwrap();
        assert_eq!(config.backend.token, "secret");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.flow.completion_delay_ms, 500);
        assert_eq!(config.camera.frames_dir, PathBuf::from("frames"));
        assert_eq!(
            config.backend.base_url().unwrap().as_str(),
            "https://kyc.example.com/api/"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = KycConfig::from_toml_str("[backend]\nbase_url = \"not a url\"").unwrap_err();
        assert!(format!("{:#}", err).contains("base_url"));
        assert!(KycConfig::from_toml_str("[backend]\nbase_url = \"ftp://x/\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(KycConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wizard.toml");
        fs::write(&path, "[camera]\nframes_dir = \"/tmp/feed\"\n").unwrap();
        let config = KycConfig::load(Some(&path)).unwrap();
        assert_eq!(config.camera.frames_dir, PathBuf::from("/tmp/feed"));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = KycConfig::default();
        let cli = Cli::parse_from([
            "kyc-wizard",
            "--base-url",
            "http://10.0.0.2:9000/api/",
            "--frames-dir",
            "shots",
            "--report-dir",
            "out",
        ]);
        config.apply_overrides(&cli).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.2:9000/api/");
        assert_eq!(config.camera.frames_dir, PathBuf::from("shots"));
        assert_eq!(config.flow.report_dir, PathBuf::from("out"));
        assert_eq!(config.flow.reference_data, None);
    }
}
