//! Connection parameters for the Vault session.

use crate::error::{SessionError, SessionResult};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Immutable parameters for one Vault session: where the backend lives,
/// how to authenticate, and which secret this service is allowed to read.
///
/// Created once at startup from validated configuration and owned by the
/// [`SessionManager`](crate::SessionManager) for its whole lifetime.
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    /// Vault server address (scheme + host + port)
    pub address: String,
    /// LDAP username used for the login exchange
    pub username: String,
    /// LDAP password; never exposed outside the login call
    pub password: SecretString,
    /// KV v2 path of the secret this service reads
    pub secret_path: String,
    /// Per-request deadline for login, renew and read calls
    pub timeout: Duration,
    /// Fraction of the granted lease TTL to wait before renewing
    pub renewal_fraction: f64,
    /// Bounded retries for a single failed renewal attempt
    pub max_renew_retries: u32,
    /// Base backoff delay between renewal retries
    pub renew_retry_delay: Duration,
}

impl ConnectionParameters {
    /// Create parameters with defaults for the operational knobs.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        secret_path: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password,
            secret_path: secret_path.into(),
            timeout: Duration::from_secs(30),
            renewal_fraction: 0.5,
            max_renew_retries: 3,
            renew_retry_delay: Duration::from_millis(250),
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the renewal fraction (clamped to 0.1-0.75).
    #[must_use]
    pub fn with_renewal_fraction(mut self, fraction: f64) -> Self {
        self.renewal_fraction = fraction.clamp(0.1, 0.75);
        self
    }

    /// Set the bounded retry count for a failed renewal attempt.
    #[must_use]
    pub const fn with_max_renew_retries(mut self, retries: u32) -> Self {
        self.max_renew_retries = retries;
        self
    }

    /// Set the base backoff delay between renewal retries.
    #[must_use]
    pub const fn with_renew_retry_delay(mut self, delay: Duration) -> Self {
        self.renew_retry_delay = delay;
        self
    }

    /// Validate the parameters before any login is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] when a required field is
    /// empty, the address is not a valid URL, or the timeout is zero.
    pub fn validate(&self) -> SessionResult<()> {
        if self.address.trim().is_empty() {
            return Err(SessionError::invalid_config("vault address must not be empty"));
        }
        Url::parse(&self.address).map_err(|e| {
            SessionError::invalid_config(format!("invalid vault address '{}': {e}", self.address))
        })?;
        if self.username.trim().is_empty() {
            return Err(SessionError::invalid_config("ldap username must not be empty"));
        }
        if secrecy::ExposeSecret::expose_secret(&self.password).is_empty() {
            return Err(SessionError::invalid_config("ldap password must not be empty"));
        }
        if self.secret_path.trim().is_empty() {
            return Err(SessionError::invalid_config("secret path must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(SessionError::invalid_config("request timeout must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params() -> ConnectionParameters {
        ConnectionParameters::new(
            "http://localhost:8200",
            "service-user",
            SecretString::from("hunter2"),
            "kv-v2/data/api-key",
        )
    }

    #[test]
    fn test_valid_parameters() {
        assert!(valid_params().validate().is_ok());
    }

    #[test]
    fn test_empty_username_rejected() {
        let mut params = valid_params();
        params.username = String::new();
        assert!(matches!(
            params.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_password_rejected() {
        let mut params = valid_params();
        params.password = SecretString::from("");
        assert!(matches!(
            params.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unparseable_address_rejected() {
        let mut params = valid_params();
        params.address = "not a url".to_string();
        assert!(matches!(
            params.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_renewal_fraction_clamping() {
        let params = valid_params().with_renewal_fraction(0.01);
        assert!((params.renewal_fraction - 0.1).abs() < f64::EPSILON);

        let params = valid_params().with_renewal_fraction(0.99);
        assert!((params.renewal_fraction - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let params = valid_params();
        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"));
    }
}
