//! Optional YAML configuration, `.iamscan.yaml` in the scanned folder unless
//! `--config` points elsewhere. CLI flags win over file values.

use crate::output::Format;
use anyhow::{Context, Result};
use iamscan_aws::AwsSettings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FILE: &str = ".iamscan.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub aws: AwsSettings,
    /// Regexes matched against `/`-separated paths; matching files and
    /// directories are not scanned.
    pub exclude: Vec<String>,
    pub format: Option<Format>,
    pub fail_on_findings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsSettings::default(),
            exclude: vec![r"(^|/)\.terraform(/|$)".to_string()],
            format: None,
            fail_on_findings: false,
        }
    }
}

impl Config {
    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.exclude
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid exclude pattern '{p}'")))
            .collect()
    }
}

pub fn parse(text: &str) -> Result<Config> {
    if text.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

pub fn load(explicit: Option<&Path>, folder: &Path) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = folder.join(DEFAULT_FILE);
            if !p.is_file() {
                return Ok(Config::default());
            }
            p
        }
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("read config {}", path.display()))?;
    let cfg = parse(&text).with_context(|| format!("parse config {}", path.display()))?;
    tracing::debug!(config = %path.display(), "loaded config");
    Ok(cfg)
}
