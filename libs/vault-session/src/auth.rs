//! Authentication strategies.
//!
//! Exactly one method is implemented (LDAP username/password), but the
//! login exchange sits behind a trait so alternate auth methods can be
//! added without touching the renewal loop: renewal operates on the
//! token, not on the method that produced it.

use crate::client::VaultClient;
use crate::error::{SessionError, SessionResult};
use crate::lease::Lease;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// The outcome of a successful login: a session token and its lease.
pub struct AuthGrant {
    pub(crate) token: SecretString,
    pub(crate) lease: Lease,
}

impl AuthGrant {
    pub(crate) const fn new(token: SecretString, lease: Lease) -> Self {
        Self { token, lease }
    }
}

/// A way of exchanging credentials for a Vault session.
#[async_trait]
pub trait AuthMethod: Send + Sync {
    /// Short name of the method, for logging.
    fn name(&self) -> &'static str;

    /// Perform the login exchange against the backend.
    async fn login(&self, client: &VaultClient) -> SessionResult<AuthGrant>;
}

/// LDAP username/password authentication.
///
/// The password is expected to arrive via a trusted orchestrator (env
/// injection, response wrapping); this type only holds it long enough to
/// send the login request and never logs it.
pub struct LdapAuth {
    username: String,
    password: SecretString,
}

impl LdapAuth {
    /// Create an LDAP auth method.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] when the username or
    /// password is empty.
    pub fn new(username: impl Into<String>, password: SecretString) -> SessionResult<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(SessionError::invalid_config("ldap username must not be empty"));
        }
        if password.expose_secret().is_empty() {
            return Err(SessionError::invalid_config("ldap password must not be empty"));
        }
        Ok(Self { username, password })
    }
}

#[async_trait]
impl AuthMethod for LdapAuth {
    fn name(&self) -> &'static str {
        "ldap"
    }

    async fn login(&self, client: &VaultClient) -> SessionResult<AuthGrant> {
        info!(username = %self.username, "logging in to vault with ldap auth");

        let body = serde_json::json!({ "password": self.password.expose_secret() });
        let grant = client
            .auth_login(&format!("auth/ldap/login/{}", self.username), body)
            .await?;

        info!("ldap login succeeded");
        Ok(grant)
    }
}

impl std::fmt::Debug for LdapAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(LdapAuth::new("", SecretString::from("pw")).is_err());
        assert!(LdapAuth::new("user", SecretString::from("")).is_err());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let auth = LdapAuth::new("alice", SecretString::from("s3cret")).unwrap();
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("alice"));
    }
}
