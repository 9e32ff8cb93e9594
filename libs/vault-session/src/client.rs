//! Vault HTTP client: the three outbound wire calls.
//!
//! Wire shapes follow Vault's published HTTP API: auth method login under
//! `/v1/auth/...`, token renewal via `/v1/auth/token/renew-self`, and KV
//! v2 reads under `/v1/{path}`. Everything else about the backend protocol
//! is out of scope here.

use crate::auth::AuthGrant;
use crate::config::ConnectionParameters;
use crate::error::{SessionError, SessionResult};
use crate::lease::Lease;
use crate::session::SecretRecord;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Auth stanza returned by login and token renewal.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    auth: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    client_token: Option<String>,
    #[serde(default)]
    lease_duration: u64,
    #[serde(default)]
    renewable: bool,
}

/// HTTP client bound to one Vault server plus the current session token.
///
/// The token is set once by login and only ever read afterwards; renewal
/// extends the same token's lease in place, so renewing never copies or
/// replaces credentials.
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    token: Option<SecretString>,
}

impl VaultClient {
    /// Create a client for the given connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the underlying HTTP client cannot
    /// be built.
    pub fn new(params: &ConnectionParameters) -> SessionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(params.timeout)
            .build()
            .map_err(SessionError::Http)?;

        Ok(Self {
            http,
            address: params.address.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Whether a login has stored a session token.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }

    fn token_header(&self) -> SessionResult<&str> {
        self.token
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .ok_or_else(|| SessionError::auth_rejected("no session token; login has not completed"))
    }

    /// Exchange credentials for a session token at an auth method's login
    /// endpoint. Used by [`AuthMethod`](crate::AuthMethod) implementations;
    /// the mount-specific path and body belong to the method.
    #[instrument(skip(self, body))]
    pub(crate) async fn auth_login(
        &self,
        login_path: &str,
        body: serde_json::Value,
    ) -> SessionResult<AuthGrant> {
        let url = format!("{}/v1/{login_path}", self.address);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::connection(e.to_string()))?;

        let status = response.status();
        if matches!(status.as_u16(), 400 | 401 | 403) {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::auth_rejected(format!("status {status}: {text}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::connection(format!("status {status}: {text}")));
        }

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| SessionError::malformed_response(e.to_string()))?;

        let auth = parsed
            .auth
            .ok_or_else(|| SessionError::malformed_response("login response missing auth stanza"))?;
        let token = auth
            .client_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SessionError::malformed_response("login response missing client token"))?;
        let lease = validate_lease(auth.lease_duration, auth.renewable)?;

        debug!(
            lease_secs = lease.ttl().as_secs(),
            renewable = lease.renewable(),
            "login exchange complete"
        );

        Ok(AuthGrant::new(SecretString::from(token), lease))
    }

    /// Renew the current session token, returning the new lease granted by
    /// the backend. A 400/403 answer is authoritative: the lease is gone
    /// and no amount of retrying will bring it back.
    #[instrument(skip(self))]
    pub(crate) async fn renew_self(&self) -> SessionResult<Lease> {
        let url = format!("{}/v1/auth/token/renew-self", self.address);
        let token = self.token_header()?.to_string();

        let response = self
            .http
            .post(&url)
            .header(VAULT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| SessionError::connection(e.to_string()))?;

        let status = response.status();
        if matches!(status.as_u16(), 400 | 403 | 404) {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "vault refused token renewal");
            return Err(SessionError::lease_expired(format!("status {status}: {text}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::connection(format!("status {status}: {text}")));
        }

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| SessionError::malformed_response(e.to_string()))?;
        let auth = parsed
            .auth
            .ok_or_else(|| SessionError::malformed_response("renew response missing auth stanza"))?;

        validate_lease(auth.lease_duration, auth.renewable)
    }

    /// Read the KV v2 secret at `path` and unwrap the nested
    /// `{"data":{"data":{...}}}` envelope into a field-value map.
    #[instrument(skip(self), fields(path))]
    pub(crate) async fn read_secret(&self, path: &str) -> SessionResult<SecretRecord> {
        let url = format!("{}/v1/{}", self.address, path.trim_start_matches('/'));
        let token = self.token_header()?.to_string();

        let response = self
            .http
            .get(&url)
            .header(VAULT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| SessionError::connection(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            401 | 403 => {
                let text = response.text().await.unwrap_or_default();
                return Err(SessionError::lease_expired(format!("status {status}: {text}")));
            }
            404 => return Err(SessionError::malformed_secret(format!("no secret at '{path}'"))),
            s if !(200..300).contains(&s) => {
                let text = response.text().await.unwrap_or_default();
                return Err(SessionError::connection(format!("status {status}: {text}")));
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SessionError::malformed_secret(e.to_string()))?;

        let inner = body
            .get("data")
            .and_then(|outer| outer.get("data"))
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| {
                SessionError::malformed_secret("response missing nested data envelope")
            })?;

        let mut record = HashMap::with_capacity(inner.len());
        for (key, value) in inner {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            record.insert(key.clone(), rendered);
        }

        debug!(fields = record.len(), "secret read complete");
        Ok(record)
    }
}

fn validate_lease(lease_duration: u64, renewable: bool) -> SessionResult<Lease> {
    if lease_duration == 0 {
        return Err(SessionError::malformed_response(
            "auth stanza granted a zero-duration lease",
        ));
    }
    Ok(Lease::new(Duration::from_secs(lease_duration), renewable))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_lease_rejected() {
        assert!(matches!(
            validate_lease(0, true),
            Err(SessionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_positive_lease_accepted() {
        let lease = validate_lease(120, false).unwrap();
        assert_eq!(lease.ttl(), Duration::from_secs(120));
        assert!(!lease.renewable());
    }
}
