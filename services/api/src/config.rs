//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use study_guide_core::share::DEFAULT_MAX_ENCODED_LEN;
use study_guide_core::DEFAULT_MAX_INPUT_CHARS;
use tracing_subscriber::EnvFilter;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// An `EnvFilter` directive string, such as `info,tower_http=debug`.
    pub log_filter: String,
    /// Directory holding the persisted history and preferences.
    pub data_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub generation_model: String,
    pub chat_model: String,
    pub max_input_chars: usize,
    pub max_upload_bytes: usize,
    pub transcript_service_url: String,
    /// Origin and path that share links point at.
    pub public_base_url: String,
    pub share_max_encoded_len: usize,
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_filter: "info".to_string(),
            data_dir: PathBuf::from("./data"),
            openai_api_key: None,
            generation_model: "gpt-4o-mini".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_upload_bytes: 50 * 1024 * 1024,
            transcript_service_url: "https://youtubetranscript.com".to_string(),
            public_base_url: "http://localhost:3000/".to_string(),
            share_max_encoded_len: DEFAULT_MAX_ENCODED_LEN,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source, falling back to the
    /// defaults for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = parse_or(&lookup, "BIND_ADDRESS", defaults.bind_address)?;

        let log_filter = match lookup("RUST_LOG") {
            Some(raw) => {
                EnvFilter::try_new(&raw).map_err(|e| {
                    ConfigError::InvalidValue("RUST_LOG".to_string(), e.to_string())
                })?;
                raw
            }
            None => defaults.log_filter,
        };

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        // --- Load API Keys (as optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());

        // --- Load Adapter-specific Settings ---
        let generation_model = lookup("GENERATION_MODEL").unwrap_or(defaults.generation_model);
        let chat_model = lookup("CHAT_MODEL").unwrap_or(defaults.chat_model);
        let max_input_chars = parse_or(&lookup, "MAX_INPUT_CHARS", defaults.max_input_chars)?;
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;
        let transcript_service_url =
            lookup("TRANSCRIPT_SERVICE_URL").unwrap_or(defaults.transcript_service_url);

        // --- Share Links and CORS ---
        let public_base_url = lookup("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url);
        let share_max_encoded_len =
            parse_or(&lookup, "SHARE_MAX_ENCODED_LEN", defaults.share_max_encoded_len)?;
        let allowed_origin = lookup("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);

        Ok(Self {
            bind_address,
            log_filter,
            data_dir,
            openai_api_key,
            generation_model,
            chat_model,
            max_input_chars,
            max_upload_bytes,
            transcript_service_url,
            public_base_url,
            share_max_encoded_len,
            allowed_origin,
        })
    }

    /// The OpenAI key, which the server cannot start without.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.max_input_chars, 30_000);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.public_base_url, "http://localhost:3000/");
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("RUST_LOG", "info,tower_http=debug"),
            ("DATA_DIR", "/var/lib/study"),
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_INPUT_CHARS", "1000"),
            ("SHARE_MAX_ENCODED_LEN", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.log_filter, "info,tower_http=debug");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/study"));
        assert_eq!(config.require_openai_api_key().unwrap(), "sk-test");
        assert_eq!(config.max_input_chars, 1000);
        assert_eq!(config.share_max_encoded_len, 2048);
    }

    #[test]
    fn invalid_numbers_are_reported_by_name() {
        let err = Config::from_lookup(lookup_from(&[("MAX_UPLOAD_BYTES", "lots")])).unwrap_err();
        match err {
            ConfigError::InvalidValue(name, _) => assert_eq!(name, "MAX_UPLOAD_BYTES"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn a_blank_api_key_is_a_missing_variable() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap();
        match config.require_openai_api_key() {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "OPENAI_API_KEY"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn log_filters_accept_directives_and_reject_garbage() {
        let config = Config::from_lookup(lookup_from(&[("RUST_LOG", "warn,api_lib=trace")])).unwrap();
        assert_eq!(config.log_filter, "warn,api_lib=trace");
        assert_eq!(Config::default().log_filter, "info");

        let err = Config::from_lookup(lookup_from(&[("RUST_LOG", "api_lib=loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "RUST_LOG"));
    }
}
