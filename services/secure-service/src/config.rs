//! Environment-driven configuration with validation.
//!
//! Missing or empty required variables are a startup-time fatal error;
//! the session core never sees unvalidated parameters.

use secrecy::SecretString;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use vault_session::ConnectionParameters;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Why parsing failed
        reason: String,
    },
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address this service listens on for http traffic
    pub listen_address: SocketAddr,
    /// Vault server address
    pub vault_address: String,
    /// LDAP username to log in to Vault
    pub vault_ldap_username: String,
    /// LDAP password to log in to Vault
    pub vault_ldap_password: SecretString,
    /// Path to the API key secret in Vault's KV v2 engine
    pub vault_api_key_path: String,
    /// Per-request deadline for Vault calls, in seconds
    pub vault_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or
    /// empty, or a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_raw = env::var("MY_ADDRESS").unwrap_or_else(|_| ":8080".to_string());
        let config = Self {
            listen_address: parse_listen_address(&listen_raw)?,
            vault_address: env::var("VAULT_ADDRESS")
                .unwrap_or_else(|_| "http://localhost:8200".to_string()),
            vault_ldap_username: require_env("VAULT_LDAP_USERNAME")?,
            vault_ldap_password: SecretString::from(require_env("VAULT_LDAP_PASSWORD")?),
            vault_api_key_path: env::var("VAULT_API_KEY_PATH")
                .unwrap_or_else(|_| "kv-v2/data/api-key".to_string()),
            vault_timeout_secs: parse_env("VAULT_TIMEOUT", 30)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.vault_address.trim().is_empty() {
            return Err(ConfigError::MissingRequired("VAULT_ADDRESS".to_string()));
        }
        if self.vault_api_key_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("VAULT_API_KEY_PATH".to_string()));
        }
        if self.vault_timeout_secs == 0 {
            return Err(ConfigError::ParseError {
                name: "VAULT_TIMEOUT".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Connection parameters for the session core.
    #[must_use]
    pub fn connection_parameters(&self) -> ConnectionParameters {
        ConnectionParameters::new(
            self.vault_address.clone(),
            self.vault_ldap_username.clone(),
            self.vault_ldap_password.clone(),
            self.vault_api_key_path.clone(),
        )
        .with_timeout(Duration::from_secs(self.vault_timeout_secs))
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingRequired(name.to_string())),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Accepts both `host:port` and the bare `:port` shorthand.
fn parse_listen_address(raw: &str) -> Result<SocketAddr, ConfigError> {
    let candidate = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    };

    candidate.parse().map_err(|e: std::net::AddrParseError| ConfigError::ParseError {
        name: "MY_ADDRESS".to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

impl Config {
    #[cfg(test)]
    fn for_tests() -> Self {
        Self {
            listen_address: "127.0.0.1:8080".parse().unwrap(),
            vault_address: "http://localhost:8200".to_string(),
            vault_ldap_username: "service-user".to_string(),
            vault_ldap_password: SecretString::from("hunter2"),
            vault_api_key_path: "kv-v2/data/api-key".to_string(),
            vault_timeout_secs: 30,
            shutdown_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_address_shorthand() {
        let addr = parse_listen_address(":8080").unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse().unwrap());

        let addr = parse_listen_address("127.0.0.1:9000").unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_invalid_listen_address_rejected() {
        assert!(matches!(
            parse_listen_address("not-an-address"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::for_tests();
        config.vault_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_parameters_carry_config_values() {
        let config = Config::for_tests();
        let params = config.connection_parameters();

        assert_eq!(params.address, "http://localhost:8200");
        assert_eq!(params.username, "service-user");
        assert_eq!(params.secret_path, "kv-v2/data/api-key");
        assert_eq!(params.timeout, Duration::from_secs(30));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = Config::for_tests();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
