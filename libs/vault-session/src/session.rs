//! Session manager: owns the authenticated Vault session.
//!
//! One login at process start, one shared client for every subsequent
//! read, one health cell that turns the renewal loop's terminal outcome
//! into observable state instead of a silently dead background task.

use crate::auth::{AuthMethod, LdapAuth};
use crate::client::VaultClient;
use crate::config::ConnectionParameters;
use crate::error::{SessionError, SessionResult};
use crate::lease::Lease;
use std::collections::HashMap;
use tokio::sync::{RwLock, watch};
use tracing::{info, instrument};

/// Field name to value mapping returned by a secret read.
///
/// Ephemeral: never cached, persisted, or logged by this crate.
pub type SecretRecord = HashMap<String, String>;

/// Observable health of the authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHealth {
    /// Session is live; reads are expected to succeed
    Active,
    /// A renewal permanently failed; reads fail fast from here on
    Expired,
    /// Shutdown canceled the renewal loop
    Canceled,
}

impl std::fmt::Display for SessionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Owns the authenticated session with the secrets backend.
///
/// The underlying client sits behind an async `RwLock`: a renewal takes
/// the write half for the duration of its backend call, a read takes the
/// read half, so a read can never observe a session mid-renewal. Raw
/// credentials stop being visible outside this type once login completes.
pub struct SessionManager {
    params: ConnectionParameters,
    auth: Box<dyn AuthMethod>,
    client: RwLock<VaultClient>,
    health: watch::Sender<SessionHealth>,
}

impl SessionManager {
    /// Create a manager that authenticates with LDAP username/password
    /// taken from the connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] for invalid parameters.
    pub fn new(params: ConnectionParameters) -> SessionResult<Self> {
        let auth = LdapAuth::new(params.username.clone(), params.password.clone())?;
        Self::with_auth(params, Box::new(auth))
    }

    /// Create a manager with an explicit authentication strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] for invalid parameters.
    pub fn with_auth(
        params: ConnectionParameters,
        auth: Box<dyn AuthMethod>,
    ) -> SessionResult<Self> {
        params.validate()?;
        let client = RwLock::new(VaultClient::new(&params)?);
        let (health, _) = watch::channel(SessionHealth::Active);

        Ok(Self { params, auth, client, health })
    }

    /// Perform the one-time login exchange and store the session token.
    ///
    /// The service must not begin serving until this has succeeded; every
    /// subsequent read depends on the session it establishes.
    ///
    /// # Errors
    ///
    /// [`SessionError::Connection`] when the backend is unreachable,
    /// [`SessionError::AuthRejected`] for bad credentials, and
    /// [`SessionError::MalformedResponse`] when the backend's session
    /// descriptor is missing required fields.
    #[instrument(skip(self), fields(address = %self.params.address, method = self.auth.name()))]
    pub async fn login(&self) -> SessionResult<Lease> {
        info!("connecting to vault");

        let grant = {
            let client = self.client.read().await;
            self.auth.login(&client).await?
        };
        let lease = grant.lease.clone();

        self.client.write().await.set_token(grant.token);

        info!(
            lease_secs = lease.ttl().as_secs(),
            renewable = lease.renewable(),
            "vault session established"
        );
        Ok(lease)
    }

    /// Read the secret at the configured path.
    ///
    /// # Errors
    ///
    /// Fails fast with [`SessionError::SessionUnavailable`] when the
    /// session is known dead; otherwise a single backend read that may
    /// fail with [`SessionError::MalformedSecret`] or
    /// [`SessionError::Connection`]. No retries at this layer.
    pub async fn read_secret(&self) -> SessionResult<SecretRecord> {
        let health = *self.health.borrow();
        if health != SessionHealth::Active {
            return Err(SessionError::SessionUnavailable(health));
        }

        let client = self.client.read().await;
        client.read_secret(&self.params.secret_path).await
    }

    /// Renew the session's lease in place. Holds the write half of the
    /// client lock for the whole backend call so reads cannot interleave.
    pub(crate) async fn renew(&self) -> SessionResult<Lease> {
        let client = self.client.write().await;
        client.renew_self().await
    }

    /// Current session health.
    #[must_use]
    pub fn health(&self) -> SessionHealth {
        *self.health.borrow()
    }

    /// Subscribe to health transitions, e.g. for a readiness endpoint.
    #[must_use]
    pub fn subscribe_health(&self) -> watch::Receiver<SessionHealth> {
        self.health.subscribe()
    }

    pub(crate) fn mark_expired(&self) {
        self.health.send_replace(SessionHealth::Expired);
    }

    pub(crate) fn mark_canceled(&self) {
        self.health.send_replace(SessionHealth::Canceled);
    }

    pub(crate) const fn params(&self) -> &ConnectionParameters {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn manager() -> SessionManager {
        SessionManager::new(ConnectionParameters::new(
            "http://localhost:8200",
            "service-user",
            SecretString::from("hunter2"),
            "kv-v2/data/api-key",
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_manager_starts_active_without_a_token() {
        let manager = manager();
        assert_eq!(manager.health(), SessionHealth::Active);

        // no login yet: the read fails at the client, before any network call
        let err = manager.read_secret().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRejected(_)));
    }

    #[tokio::test]
    async fn test_read_fails_fast_when_expired() {
        let manager = manager();
        manager.mark_expired();

        let err = manager.read_secret().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::SessionUnavailable(SessionHealth::Expired)
        ));
    }

    #[tokio::test]
    async fn test_read_fails_fast_when_canceled() {
        let manager = manager();
        manager.mark_canceled();

        let err = manager.read_secret().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::SessionUnavailable(SessionHealth::Canceled)
        ));
    }

    #[tokio::test]
    async fn test_health_transitions_are_observable() {
        let manager = manager();
        let mut rx = manager.subscribe_health();

        assert_eq!(manager.health(), SessionHealth::Active);
        manager.mark_expired();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionHealth::Expired);
    }

    #[test]
    fn test_invalid_parameters_rejected_at_construction() {
        let params = ConnectionParameters::new(
            "http://localhost:8200",
            "",
            SecretString::from("pw"),
            "kv-v2/data/api-key",
        );
        assert!(SessionManager::new(params).is_err());
    }
}
