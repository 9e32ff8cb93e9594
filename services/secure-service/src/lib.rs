//! secure-service: demo HTTP facade over a Vault-authenticated session.
//!
//! All the interesting work lives in the `vault-session` crate; this
//! crate parses the environment, wires up the router, and maps session
//! outcomes to HTTP responses.

pub mod config;
pub mod handlers;
pub mod shutdown;
