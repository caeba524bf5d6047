use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Overrides the config-file `api_key` when set and non-empty.
pub const API_KEY_ENV_VAR: &str = "FLOWDEPLOY_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub business_unit_id: String,
}

impl PipelineConfig {
    /// Loads configuration from a YAML file. Read once at startup; the
    /// config is immutable afterward.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("read config {}", path.display())),
            )
        })?;

        serde_yml::from_str(&raw)
            .map_err(|e| Error::config_invalid_yaml(path.display().to_string(), e))
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// Effective API credential: the environment variable wins over the
    /// config-file value. Missing both is a construction-time failure.
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_api_key_from(std::env::var(API_KEY_ENV_VAR).ok(), self.api_key.as_deref())
    }
}

fn resolve_api_key_from(env_value: Option<String>, file_value: Option<&str>) -> Result<String> {
    if let Some(key) = env_value.filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    file_value
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(Error::config_missing_credential)
}
