mod loader;
pub mod secrets;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable selecting the active profile.
pub const PROFILE_VAR: &str = "TABULA_PROFILE";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env`, then `.env.{profile}` (loaded into the process environment)
/// 4. Environment variables (`SERVER_PORT` overrides `server.port`)
///
/// `.env` files never overwrite already-set environment variables. `${...}`
/// placeholders in YAML strings are resolved after the `.env` files are read,
/// so they may refer to variables defined there.
///
/// Profile is determined by: `TABULA_PROFILE` env var > argument > default `"dev"`.
#[derive(Debug, Clone)]
pub struct TabulaConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl TabulaConfig {
    /// Load from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load from `dir` with the default resolver (env + file).
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(dir, profile, &DefaultSecretResolver)
    }

    pub fn load_with_resolver(
        dir: &Path,
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let profile = std::env::var(PROFILE_VAR)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| {
                if profile.is_empty() {
                    "dev".to_string()
                } else {
                    profile.to_string()
                }
            });

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("application.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("application-{profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{profile}")));

        let mut config = TabulaConfig { values, profile };
        config.resolve_placeholders(resolver)?;
        Ok(config.with_env_overlay(std::env::vars()))
    }

    /// Create a config from a YAML string. No env overlay, no placeholder resolution.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(TabulaConfig {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        TabulaConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Overlay `vars` as environment variables: `APP_ENVIRONMENT=prod` sets `app.environment`.
    pub fn with_env_overlay<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (var, value) in vars {
            self.values.insert(loader::env_key(&var), ConfigValue::String(value));
        }
        self
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning `default` if the key is missing or unconvertible.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// First of `keys` that is present, converted.
    pub fn get_first<V: FromConfigValue>(&self, keys: &[&str]) -> Result<V, ConfigError> {
        match keys.iter().find(|k| self.contains_key(k)) {
            Some(key) => self.get(key),
            None => Err(ConfigError::NotFound(keys.join(" | "))),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn resolve_placeholders(&mut self, resolver: &dyn SecretResolver) -> Result<(), ConfigError> {
        for value in self.values.values_mut() {
            if let ConfigValue::String(s) = value {
                if s.contains("${") {
                    *s = secrets::resolve_placeholders(s, resolver)?;
                }
            }
        }
        Ok(())
    }
}
