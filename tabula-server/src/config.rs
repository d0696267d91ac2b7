use std::path::Path;
use std::time::Duration;

use tabula_core::{ConfigError, FromConfigValue, LogFormat, TabulaConfig};
use tabula_data::DataError;
use tabula_data_postgrest::{ClientOptions, Credentials};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PREFIX: &str = "/api/v1";

/// Server settings read from [`TabulaConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub environment: String,
    pub log_format: LogFormat,
    pub schema: String,
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_prefix: DEFAULT_PREFIX.to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
            schema: "public".to_string(),
            request_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Missing keys fall back to defaults; present keys of the wrong type are errors.
    pub fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout = request_timeout(optional(config.get("supabase.timeout"))?)?;
        let log_format: Option<String> = optional(config.get("log.format"))?;

        Ok(Self {
            host: or_default(config.get("server.host"), defaults.host)?,
            port: or_default(config.get_first(&["server.port", "port"]), defaults.port)?,
            api_prefix: or_default(config.get("api.prefix"), defaults.api_prefix)?,
            environment: or_default(config.get("app.environment"), defaults.environment)?,
            log_format: log_format.map_or(defaults.log_format, |f| LogFormat::parse(&f)),
            schema: or_default(config.get("supabase.schema"), defaults.schema)?,
            request_timeout: timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::default().schema(self.schema.clone());
        match self.request_timeout {
            Some(timeout) => options.request_timeout(timeout),
            None => options,
        }
    }
}

/// Load `dir`'s configuration, or fall back to the environment alone.
///
/// The load error is handed back so it can be logged once tracing is up.
pub fn load_or_env(dir: &Path, profile: &str) -> (TabulaConfig, Option<ConfigError>) {
    match TabulaConfig::load_from(dir, profile) {
        Ok(config) => (config, None),
        Err(err) => (
            TabulaConfig::empty().with_env_overlay(std::env::vars()),
            Some(err),
        ),
    }
}

/// Backend credentials from `supabase.url` / `supabase.key`.
///
/// The environment overlay maps `SUPABASE_URL` onto `supabase.url`, so
/// the variables, `.env` files and YAML all feed the same lookup.
pub fn credentials(config: &TabulaConfig) -> Result<Credentials, DataError> {
    Credentials::from_lookup(|var| {
        config
            .get::<String>(&var.to_lowercase().replace('_', "."))
            .ok()
    })
}

/// Seconds to a timeout. Zero, negative and NaN disable it; overflow is an error.
fn request_timeout(secs: Option<f64>) -> Result<Option<Duration>, ConfigError> {
    match secs.filter(|secs| *secs > 0.0) {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| ConfigError::TypeMismatch {
                key: "supabase.timeout".to_string(),
                expected: "finite number of seconds",
            }),
        None => Ok(None),
    }
}

fn optional<V>(result: Result<V, ConfigError>) -> Result<Option<V>, ConfigError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

fn or_default<V: FromConfigValue>(
    result: Result<V, ConfigError>,
    default: V,
) -> Result<V, ConfigError> {
    optional(result).map(|value| value.unwrap_or(default))
}
