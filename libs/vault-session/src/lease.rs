//! Lease handle for an authenticated Vault session.

use std::time::Duration;

/// A time-bounded grant of validity for the authenticated session.
///
/// Produced by login and by each successful renewal; consumed exclusively
/// by the renewal loop. Callers outside the session manager never inspect
/// one.
#[derive(Debug, Clone)]
pub struct Lease {
    ttl: Duration,
    renewable: bool,
}

impl Lease {
    /// A lease always carries a positive TTL; the client layer rejects
    /// zero-duration grants as malformed before constructing one.
    pub(crate) const fn new(ttl: Duration, renewable: bool) -> Self {
        Self { ttl, renewable }
    }

    /// Granted time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the backend will accept renewal calls for this lease.
    #[must_use]
    pub const fn renewable(&self) -> bool {
        self.renewable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_accessors() {
        let lease = Lease::new(Duration::from_secs(3600), true);
        assert_eq!(lease.ttl(), Duration::from_secs(3600));
        assert!(lease.renewable());
    }
}
