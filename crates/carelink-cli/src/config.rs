use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// Per-profile CLI preferences, stored in `~/.carelink/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

impl ProfileConfig {
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format.as_deref().and_then(OutputFormat::parse)
    }

    /// Apply `key = value`, rejecting unknown keys and unusable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    anyhow::bail!("server must be an http(s) URL, got {value}");
                }
                self.server = Some(value.trim_end_matches('/').to_string());
            }
            "format" => {
                if OutputFormat::parse(value).is_none() {
                    anyhow::bail!("Unknown format: {value}. Valid formats: json, table");
                }
                self.format = Some(value.to_ascii_lowercase());
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
        }
        Ok(())
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

pub fn carelink_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".carelink");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(carelink_dir()?.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    load_all_from(&config_path()?)
}

fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all()?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)?;
    Ok(())
}

/// Server to talk to, if anything overrides the client settings.
pub fn resolve_server(cli_server: &Option<String>, profile: &ProfileConfig) -> Option<String> {
    // 1. --server flag / CARELINK_URL env
    // 2. config.toml profile
    cli_server.clone().or_else(|| profile.server.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_validates_keys_and_values() {
        let mut cfg = ProfileConfig::default();
        cfg.set("server", "https://api.clinic.example/api/").unwrap();
        cfg.set("format", "Table").unwrap();

        assert_eq!(cfg.server.as_deref(), Some("https://api.clinic.example/api"));
        assert_eq!(cfg.output_format(), Some(OutputFormat::Table));
        assert!(cfg.set("server", "ftp://nope").is_err());
        assert!(cfg.set("format", "yaml").is_err());
        assert!(cfg.set("color", "always").is_err());
    }

    #[test]
    fn test_profiles_are_stored_side_by_side() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let staging = ProfileConfig {
            server: Some("https://staging.example/api".into()),
            format: None,
        };
        let prod = ProfileConfig {
            server: Some("https://prod.example/api".into()),
            format: Some("table".into()),
        };

        save_profile_to(&path, "staging", &staging).unwrap();
        save_profile_to(&path, "prod", &prod).unwrap();

        let all = load_all_from(&path).unwrap();
        assert_eq!(all.get("staging"), Some(&staging));
        assert_eq!(all.get("prod"), Some(&prod));
    }

    #[test]
    fn test_flag_wins_over_profile() {
        let profile = ProfileConfig {
            server: Some("https://profile.example/api".into()),
            format: None,
        };
        assert_eq!(
            resolve_server(&Some("http://localhost:4000/api".into()), &profile).as_deref(),
            Some("http://localhost:4000/api")
        );
        assert_eq!(
            resolve_server(&None, &profile).as_deref(),
            Some("https://profile.example/api")
        );
        assert_eq!(resolve_server(&None, &ProfileConfig::default()), None);
    }
}
