//! Configuration Loader
//!
//! Environment-aware layered loading built on the `config` crate. Later
//! sources override earlier ones:
//!
//! 1. built-in defaults ([`PipelineConfig::default`])
//! 2. `<dir>/pipeline.toml`
//! 3. `<dir>/pipeline.<environment>.toml`
//! 4. `STORE_RECS__<SECTION>__<KEY>` environment variables
//!
//! Identities and notification addresses are expected to arrive through the
//! last layer, e.g. `STORE_RECS__IDENTITY__DELEGATE_TO` or
//! `STORE_RECS__NOTIFICATIONS__EMAILS=a@example.com,b@example.com`.

use super::error::{ConfigResult, ConfigurationError};
use super::PipelineConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const ENV_PREFIX: &str = "STORE_RECS";
const ENV_SEPARATOR: &str = "__";
const LIST_KEYS: [&str; 3] = [
    "notifications.emails",
    "identity.service_account_scopes",
    "cluster.init_action_uris",
];

pub struct ConfigManager {
    config: PipelineConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_source(config_dir, environment, None)
    }

    /// Load configuration with an explicit set of environment variables instead
    /// of the process environment. Useful for tests that must not touch global state.
    pub fn load_with_env_source(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_source: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading pipeline configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, env_source)?;
        config.validate()?;

        debug!(
            config = %serde_json::to_string(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string()),
            "Configuration merged"
        );

        info!(
            environment = %environment,
            dag_id = %config.pipeline.dag_id,
            schedule = %config.pipeline.schedule,
            retries = config.retry.retries,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        env_source: Option<HashMap<String, String>>,
    ) -> ConfigResult<PipelineConfig> {
        let mut env_layer = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            env_layer = env_layer.with_list_parse_key(key);
        }
        if let Some(vars) = env_source {
            env_layer = env_layer.source(Some(vars.into_iter().collect()));
        }

        // Every section is `#[serde(default)]`, so keys absent from all layers
        // resolve to the built-in defaults during deserialization.
        let merged = Config::builder()
            .add_source(
                File::from(config_directory.join("pipeline.toml"))
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(config_directory.join(format!("pipeline.{environment}.toml")))
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(env_layer)
            .build()?;

        merged
            .try_deserialize::<PipelineConfig>()
            .map_err(|e| ConfigurationError::ParseError {
                reason: e.to_string(),
            })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Configuration as JSON with identities and addresses masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn sanitize_config_for_logging(config: &PipelineConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["delegate", "account", "email", "project"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        Self::mask(val);
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }

    fn mask(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) if s.is_empty() => {}
            serde_json::Value::Array(items) => items.iter_mut().for_each(Self::mask),
            _ => *value = serde_json::Value::String("[MASKED]".to_string()),
        }
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("STORE_RECS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("STORE_RECS_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config"))
    }
}
