//! Best-effort saving of a newly entered address to the user's profile.
//!
//! The save runs as a detached Tokio task. Order confirmation never waits on
//! it; a failure is logged and reported on the session's failure channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_core::{StructuredAddress, UserId};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::address::ResolvedAddress;
use crate::profile::ProfileClient;

/// A background save that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceFailure {
    /// User whose profile was being updated.
    pub user_id: UserId,
    /// Error description.
    pub message: String,
    /// When the failure was observed.
    pub at: DateTime<Utc>,
}

/// Count of saves still running.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    /// Count one more save; the count drops again when the guard is dropped,
    /// including on panic or abort of the task holding it.
    fn start(self: &Arc<Self>) -> SaveGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        SaveGuard(Arc::clone(self))
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let idle = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

struct SaveGuard(Arc<InFlight>);

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Saves addresses for one signed-in user.
#[derive(Debug, Clone)]
pub struct AddressPersistence {
    client: ProfileClient,
    user_id: UserId,
    failures: mpsc::UnboundedSender<PersistenceFailure>,
    in_flight: Arc<InFlight>,
}

impl AddressPersistence {
    /// Create a saver and the receiving end of its failure channel.
    #[must_use]
    pub fn new(
        client: ProfileClient,
        user_id: UserId,
    ) -> (Self, mpsc::UnboundedReceiver<PersistenceFailure>) {
        let (failures, receiver) = mpsc::unbounded_channel();
        (
            Self {
                client,
                user_id,
                failures,
                in_flight: Arc::default(),
            },
            receiver,
        )
    }

    /// User whose profile receives saved addresses.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Number of saves that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for running saves to finish.
    ///
    /// Returns `true` when nothing is left in flight. Saves still running at
    /// the deadline keep running.
    pub async fn settle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.in_flight.wait_idle())
            .await
            .is_ok()
    }

    /// Spawn a background task that stores `address` on the profile.
    ///
    /// Must be called from within a Tokio runtime. The returned handle may be
    /// dropped; the task keeps running detached.
    pub fn spawn_save(&self, address: StructuredAddress) -> JoinHandle<()> {
        let client = self.client.clone();
        let user_id = self.user_id;
        let failures = self.failures.clone();

        info!(user_id = %user_id, "Spawning background address save");
        let guard = self.in_flight.start();
        tokio::spawn(async move {
            let _guard = guard;
            match client.update_address(user_id, &address).await {
                Ok(message) => {
                    info!(user_id = %user_id, message = %message, "Saved address to profile");
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to save address to profile");
                    // The session may already be gone; nobody left to tell.
                    let _ = failures.send(PersistenceFailure {
                        user_id,
                        message: e.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        })
    }
}

/// Start the background save if `resolved` asked for one.
///
/// Without a signed-in user there is no profile to write to, so the request
/// is dropped.
pub(crate) fn save_if_requested(
    resolved: &ResolvedAddress,
    persistence: Option<&AddressPersistence>,
) {
    let Some(address) = resolved.save_request() else {
        return;
    };
    match persistence {
        Some(persistence) => {
            persistence.spawn_save(address.clone());
        }
        None => tracing::debug!("Address save requested without a signed-in user; skipping"),
    }
}
