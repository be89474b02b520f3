use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pixatools_adapters::{GatewayConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use pixatools_domain::{QuotaPolicy, DEFAULT_AI_CALL_LIMIT, DEFAULT_QUOTA_WINDOW_MS};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "pixatools.toml";
const API_KEY_VARS: [&str; 3] = ["PIXATOOLS_API_KEY", "GEMINI_API_KEY", "API_KEY"];
const STATE_PATH_VAR: &str = "PIXATOOLS_STATE_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub state_path: String,
    pub output_dir: String,
    pub quota: QuotaConfig,
    pub gateway: GatewaySection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaConfig {
    pub daily_ai_calls: u32,
    pub window_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySection {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: "pixatools.sqlite3".to_string(),
            output_dir: ".".to_string(),
            quota: QuotaConfig::default(),
            gateway: GatewaySection::default(),
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_ai_calls: DEFAULT_AI_CALL_LIMIT,
            window_hours: (DEFAULT_QUOTA_WINDOW_MS / (60 * 60 * 1000)) as u32,
        }
    }
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by the TOML file (an explicit path must exist, the
    /// default `pixatools.toml` is optional), then by the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|error| format!("cannot read config {}: {error}", path.display()))?;
        Self::from_toml(&raw).map_err(|error| format!("invalid config {}: {error}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.gateway.api_key = Some(key);
        }
        if let Some(path) = lookup(STATE_PATH_VAR).filter(|value| !value.trim().is_empty()) {
            self.state_path = path;
        }
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            limit: self.quota.daily_ai_calls,
            window_ms: i64::from(self.quota.window_hours) * 60 * 60 * 1000,
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint: self.gateway.endpoint.clone(),
            model: self.gateway.model.clone(),
            api_key: self.gateway.api_key.clone().unwrap_or_default(),
            timeout: Duration::from_secs(self.gateway.timeout_secs),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_matches_builtin_quota() {
        let config = AppConfig::default();
        assert_eq!(config.state_path, "pixatools.sqlite3");
        assert_eq!(config.quota_policy(), QuotaPolicy::default());
        assert_eq!(config.gateway_config().model, DEFAULT_MODEL);
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = AppConfig::from_toml(
            r#"
            state_path = "/tmp/state.sqlite3"

            [quota]
            daily_ai_calls = 10
            "#,
        )
        .expect("parse");
        assert_eq!(config.state_path, "/tmp/state.sqlite3");
        assert_eq!(config.quota_policy().limit, 10);
        assert_eq!(config.quota_policy().window_ms, DEFAULT_QUOTA_WINDOW_MS);
        assert_eq!(config.gateway.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn env_overrides_key_and_state_path() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("PIXATOOLS_API_KEY", " "),
            ("PIXATOOLS_STATE_PATH", "elsewhere.sqlite3"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_env(|name| env.get(name).map(|value| value.to_string()));

        assert_eq!(config.gateway.api_key.as_deref(), Some("secret"));
        assert_eq!(config.state_path, "elsewhere.sqlite3");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
