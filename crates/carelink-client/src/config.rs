use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub paging: PagingSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // API validations
        let url = self
            .api
            .base_url()
            .map_err(|e| ConfigError::invalid(format!("api.base_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("api.base_url must use http or https"));
        }
        if self.api.request_timeout_ms == 0 || self.api.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid("api timeouts must be > 0"));
        }
        // Paging validations
        for (name, size) in self.paging.named() {
            if size == 0 {
                return Err(ConfigError::invalid(format!("paging.{name} must be > 0")));
            }
        }
        // Auth validations
        if self.auth.vault_namespace.trim().is_empty() {
            return Err(ConfigError::invalid("auth.vault_namespace must not be empty"));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    /// Root every endpoint path is appended to, e.g. `https://host/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".into()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_user_agent() -> String {
    format!("carelink/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiSettings {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.base_url.trim())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    /// Refresh and retry once when an authenticated request gets a 401,
    /// instead of ending the session immediately.
    #[serde(default)]
    pub refresh_on_unauthorized: bool,
    #[serde(default = "default_vault_namespace")]
    pub vault_namespace: String,
}

fn default_vault_namespace() -> String {
    carelink_auth::vault::DEFAULT_NAMESPACE.into()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_on_unauthorized: false,
            vault_namespace: default_vault_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagingSettings {
    #[serde(default = "default_page_size")]
    pub patients: u32,
    #[serde(default = "default_page_size")]
    pub inquiries: u32,
    #[serde(default = "default_page_size")]
    pub evaluations: u32,
    #[serde(default = "default_page_size")]
    pub appointments: u32,
}

fn default_page_size() -> u32 {
    20
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            patients: default_page_size(),
            inquiries: default_page_size(),
            evaluations: default_page_size(),
            appointments: default_page_size(),
        }
    }
}

impl PagingSettings {
    fn named(&self) -> [(&'static str, u32); 4] {
        [
            ("patients", self.patients),
            ("inquiries", self.inquiries),
            ("evaluations", self.evaluations),
            ("appointments", self.appointments),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{ClientConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_FILE: &str = "carelink.toml";

    pub fn load_config(path: Option<&str>) -> Result<ClientConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., CARELINK__API__BASE_URL=https://...
        builder = builder.add_source(
            Environment::with_prefix("CARELINK")
                .try_parsing(true)
                .separator("__"),
        );
        let merged: ClientConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<ClientConfig, ConfigError> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ClientConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:3000/api");
        assert_eq!(cfg.api.request_timeout(), Duration::from_secs(30));
        assert!(!cfg.auth.refresh_on_unauthorized);
        assert_eq!(cfg.paging.appointments, 20);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut cfg = ClientConfig::default();
        cfg.api.base_url = "not a url".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("api.base_url"));

        let mut cfg = ClientConfig::default();
        cfg.api.base_url = "ftp://example.com".into();
        assert!(cfg.validate().is_err());

        let mut cfg = ClientConfig::default();
        cfg.paging.inquiries = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("paging.inquiries"));

        let mut cfg = ClientConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = ClientConfig::default();
        cfg.api.connect_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let cfg: ClientConfig = serde_json::from_str(
            r#"{
                "api": { "base_url": "https://clinic.example/api" },
                "paging": { "patients": 50 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://clinic.example/api");
        assert_eq!(cfg.api.connect_timeout_ms, 10_000);
        assert_eq!(cfg.paging.patients, 50);
        assert_eq!(cfg.paging.evaluations, 20);
    }
}
