//! In-flight order submission tracking.
//!
//! While an order is being created for a session, a second submission from
//! the same session is refused. Entries expire after the configured timeout
//! so a leaked guard cannot lock a session out for good.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use moka::ops::compute::Op;

/// Sessions with an order submission in flight, each mapped to the token of
/// the guard holding it.
#[derive(Clone)]
pub struct SubmissionRegistry {
    in_flight: Cache<String, u64>,
    next_token: Arc<AtomicU64>,
}

impl SubmissionRegistry {
    /// Create a registry whose entries expire after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let in_flight = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(timeout)
            .build();

        Self {
            in_flight,
            next_token: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Mark `key` as submitting.
    ///
    /// Returns `None` if a submission for `key` is already in flight.
    pub async fn acquire(&self, key: &str) -> Option<SubmissionGuard> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let entry = self.in_flight.entry(key.to_owned()).or_insert(token).await;
        if !entry.is_fresh() {
            return None;
        }

        Some(SubmissionGuard {
            key: key.to_owned(),
            token,
            in_flight: self.in_flight.clone(),
            released: false,
        })
    }
}

/// Held for the duration of one order submission.
///
/// Call [`release`](Self::release) when the submission finishes. A guard
/// dropped without release frees its key in the background. A guard whose
/// entry expired and was taken by a newer submission frees nothing.
#[must_use = "dropping the guard re-enables submission"]
pub struct SubmissionGuard {
    key: String,
    token: u64,
    in_flight: Cache<String, u64>,
    released: bool,
}

impl SubmissionGuard {
    /// Re-enable submission for this key.
    pub async fn release(mut self) {
        remove_if_held(&self.in_flight, self.key.clone(), self.token).await;
        self.released = true;
    }
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let in_flight = self.in_flight.clone();
            let key = std::mem::take(&mut self.key);
            let token = self.token;
            handle.spawn(async move { remove_if_held(&in_flight, key, token).await });
        }
    }
}

async fn remove_if_held(in_flight: &Cache<String, u64>, key: String, token: u64) {
    in_flight
        .entry(key)
        .and_compute_with(|entry| {
            let op = match entry {
                Some(entry) if *entry.value() == token => Op::Remove,
                _ => Op::Nop,
            };
            std::future::ready(op)
        })
        .await;
}
