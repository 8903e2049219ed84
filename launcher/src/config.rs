//! Launcher configuration module.
//!
//! This module provides configuration loading for the launcher from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `JWT_SIGNING_KEY_PATH`: PEM file holding the PKCS#1 RSA signing key (required)
//! - `JWT_ENCRYPTION_KEY_PATH`: PEM file holding the PKIX RSA encryption key (required)
//! - `SURVEY_RUNNER_URL`: Base URL that issued tokens are sent to (default: `http://localhost:5000`)
//! - `PORT`: Port to listen on (default: `8000`)
//!
//! # Invariants
//!
//! - Both key paths are non-empty. Whether they point at readable keys is only
//!   discovered when a token is issued.
//! - `survey_runner_url` never ends with `/`.

use std::path::PathBuf;

/// Locations of the two key files used when issuing a token.
///
/// Keys are read from these paths on every call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    /// PEM file containing a PKCS#1 RSA private key, used for signing.
    pub signing: PathBuf,
    /// PEM file containing a PKIX RSA public key, used for encryption.
    pub encryption: PathBuf,
}

impl KeyPaths {
    #[must_use]
    pub fn new(signing: impl Into<PathBuf>, encryption: impl Into<PathBuf>) -> Self {
        Self {
            signing: signing.into(),
            encryption: encryption.into(),
        }
    }
}

/// Launcher configuration.
///
/// # Post-conditions
///
/// - `listen_port` is always a valid `u16`
/// - `survey_runner_url` has no trailing slash
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Key files used for signing and encrypting tokens.
    pub key_paths: KeyPaths,
    /// Base URL of the survey runner; tokens are delivered to `{url}/session`.
    pub survey_runner_url: String,
    /// Port to listen on for form submissions.
    pub listen_port: u16,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl LauncherConfig {
    /// Default port for the launcher.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default survey runner location.
    pub const DEFAULT_SURVEY_RUNNER_URL: &'static str = "http://localhost:5000";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - either key path variable is not set or is empty
    /// - `PORT` is set but not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing = required_path(&lookup, "JWT_SIGNING_KEY_PATH")?;
        let encryption = required_path(&lookup, "JWT_ENCRYPTION_KEY_PATH")?;
        let survey_runner_url = lookup("SURVEY_RUNNER_URL")
            .unwrap_or_else(|| Self::DEFAULT_SURVEY_RUNNER_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let listen_port = load_listen_port(&lookup)?;

        Ok(Self {
            key_paths: KeyPaths {
                signing,
                encryption,
            },
            survey_runner_url,
            listen_port,
        })
    }
}

/// Load a required, non-empty path.
fn required_path<F>(lookup: &F, name: &str) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;

    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must not be empty".to_string(),
        });
    }

    Ok(PathBuf::from(value))
}

/// Load the listen port, falling back to the default when unset.
fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("PORT") {
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            name: "PORT".to_string(),
            message: format!("'{value}' is not a valid port number (must be 1-65535)"),
        }),
        None => Ok(LauncherConfig::DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        assert_eq!(LauncherConfig::DEFAULT_PORT, 8000);
        assert_eq!(
            LauncherConfig::DEFAULT_SURVEY_RUNNER_URL,
            "http://localhost:5000"
        );
    }

    #[test]
    fn test_from_lookup_with_defaults() {
        let config = LauncherConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY_PATH", "/keys/signing.pem"),
            ("JWT_ENCRYPTION_KEY_PATH", "/keys/encryption.pem"),
        ]))
        .expect("config should load");

        assert_eq!(
            config.key_paths,
            KeyPaths::new("/keys/signing.pem", "/keys/encryption.pem")
        );
        assert_eq!(config.survey_runner_url, "http://localhost:5000");
        assert_eq!(config.listen_port, 8000);
    }

    #[test]
    fn test_from_lookup_trims_runner_url_and_reads_port() {
        let config = LauncherConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY_PATH", "a.pem"),
            ("JWT_ENCRYPTION_KEY_PATH", "b.pem"),
            ("SURVEY_RUNNER_URL", "https://runner.example/"),
            ("PORT", "9090"),
        ]))
        .expect("config should load");

        assert_eq!(config.survey_runner_url, "https://runner.example");
        assert_eq!(config.listen_port, 9090);
    }

    #[test]
    fn test_missing_signing_key_path() {
        let result = LauncherConfig::from_lookup(lookup_from(&[(
            "JWT_ENCRYPTION_KEY_PATH",
            "b.pem",
        )]));
        assert_eq!(
            result.err(),
            Some(ConfigError::MissingEnvVar("JWT_SIGNING_KEY_PATH".to_string()))
        );
    }

    #[test]
    fn test_empty_encryption_key_path() {
        let result = LauncherConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY_PATH", "a.pem"),
            ("JWT_ENCRYPTION_KEY_PATH", ""),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "JWT_ENCRYPTION_KEY_PATH"
        ));
    }

    #[test]
    fn test_invalid_port() {
        let result = LauncherConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY_PATH", "a.pem"),
            ("JWT_ENCRYPTION_KEY_PATH", "b.pem"),
            ("PORT", "99999"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "PORT"
        ));
    }

    #[test]
    fn test_config_error_display_missing() {
        let error = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: TEST_VAR"
        );
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
