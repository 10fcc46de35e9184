//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Known keys, for `config get|set`
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "api_url" => Some(&mut self.api_url),
            "token" => Some(&mut self.token),
            "default_format" => Some(&mut self.default_format),
            _ => None,
        }
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        Ok(home.join(".formctl").join("config.toml"))
    }
}

/// Shown instead of the full token
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{visible}****")
}
