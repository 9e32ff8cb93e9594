//! HashiCorp Vault session lifecycle for secure-service.
//!
//! Logs in once at process start, keeps the resulting token lease alive
//! with a background renewal loop, and exposes a narrow accessor for the
//! one secret the service needs.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod lease;
pub mod renewal;
pub mod retry;
pub mod session;

pub use auth::{AuthMethod, LdapAuth};
pub use config::ConnectionParameters;
pub use error::{SessionError, SessionResult};
pub use lease::Lease;
pub use renewal::spawn_renewal;
pub use retry::{RetryConfig, RetryPolicy};
pub use session::{SecretRecord, SessionHealth, SessionManager};
