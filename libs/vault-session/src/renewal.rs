//! Background lease renewal loop.
//!
//! State machine: active -> renewing -> active on the happy path;
//! terminal `expired` when a renewal permanently fails, terminal
//! `canceled` on shutdown. Terminal outcomes are published through the
//! session manager's health cell rather than being dropped on the floor.

use crate::error::SessionError;
use crate::lease::Lease;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Spawn the renewal loop as an independent background task.
///
/// The task runs for the life of the process, waking at a fraction of
/// each granted lease TTL to renew it. It communicates no return value;
/// failures surface through logging and through the session health cell,
/// after which reads fail fast. `shutdown` flipping to `true` (or its
/// sender being dropped) stops the loop promptly at its next wait point.
pub fn spawn_renewal(
    manager: Arc<SessionManager>,
    lease: Lease,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(renewal_loop(manager, lease, shutdown))
}

async fn renewal_loop(
    manager: Arc<SessionManager>,
    lease: Lease,
    mut shutdown: watch::Receiver<bool>,
) {
    if !lease.renewable() {
        // never attempt a renew call on a non-renewable lease
        info!(
            lease_secs = lease.ttl().as_secs(),
            "vault lease is not renewable; renewal loop exiting"
        );
        return;
    }

    let params = manager.params();
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_max_retries(params.max_renew_retries)
            .with_initial_delay(params.renew_retry_delay),
    );
    let fraction = params.renewal_fraction;
    let mut ttl = lease.ttl();

    loop {
        if *shutdown.borrow() {
            info!("renewal loop canceled");
            manager.mark_canceled();
            return;
        }

        // renew at a fraction of the granted TTL so at least one retry
        // window remains before the lease would actually lapse
        let wait = next_renewal_delay(ttl, fraction);
        debug!(wait_ms = wait.as_millis() as u64, "scheduling next renewal");

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => {
                info!("renewal loop canceled");
                manager.mark_canceled();
                return;
            }
        }

        match renew_with_retry(&manager, &policy, &mut shutdown).await {
            RenewOutcome::Renewed(new_ttl) => {
                // durations may change over time; always recompute from
                // the TTL the backend just granted
                ttl = new_ttl;
            }
            RenewOutcome::Canceled => {
                info!("renewal loop canceled");
                manager.mark_canceled();
                return;
            }
            RenewOutcome::Expired(err) => {
                error!(error = %err, "unable to renew vault lease; session is dead");
                manager.mark_expired();
                return;
            }
        }
    }
}

enum RenewOutcome {
    Renewed(Duration),
    Canceled,
    Expired(SessionError),
}

async fn renew_with_retry(
    manager: &SessionManager,
    policy: &RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
) -> RenewOutcome {
    let mut attempt = 0;
    loop {
        if *shutdown.borrow() {
            return RenewOutcome::Canceled;
        }

        match manager.renew().await {
            Ok(lease) => {
                info!(lease_secs = lease.ttl().as_secs(), "vault lease renewed");
                return RenewOutcome::Renewed(lease.ttl());
            }
            Err(err) if policy.should_retry(&err, attempt) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "renewal attempt failed; retrying"
                );
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => return RenewOutcome::Canceled,
                }
                attempt += 1;
            }
            Err(err) => return RenewOutcome::Expired(err),
        }
    }
}

fn next_renewal_delay(ttl: Duration, fraction: f64) -> Duration {
    ttl.mul_f64(fraction.clamp(0.1, 0.75))
}
