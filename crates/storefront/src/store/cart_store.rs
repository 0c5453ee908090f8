//! Cart store: state, dispatch and snapshot mirroring.

use agar_shop_core::{CartAction, CartState};

use super::{CartStorage, StorageError};

/// One session's cart.
///
/// Opening the store reads the snapshot once; each [`dispatch`](Self::dispatch)
/// reduces the in-memory state and then writes the snapshot back. The slot
/// is a passive mirror: it never changes the in-memory state on its own, and
/// a failed write is logged rather than undoing the dispatch.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the store, restoring the saved snapshot if it is usable.
    ///
    /// A missing, unreadable or malformed snapshot yields the empty cart;
    /// opening never fails.
    pub async fn open(storage: S) -> Self {
        let state = match storage.load().await {
            Ok(Some(raw)) => decode_snapshot(&raw),
            Ok(None) => CartState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart snapshot, starting empty");
                CartState::default()
            }
        };

        Self { state, storage }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Apply an action and persist the result.
    pub async fn dispatch(&mut self, action: CartAction) -> &CartState {
        let name = action.name();
        self.state.apply(action);
        tracing::debug!(
            action = name,
            items = self.state.cart_items.len(),
            "Cart action applied"
        );

        if let Err(e) = self.persist().await {
            tracing::warn!(action = name, error = %e, "Failed to persist cart snapshot");
        }
        &self.state
    }

    /// Reset the cart and drop the persisted slot entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be cleared; the in-memory state
    /// is reset regardless.
    pub async fn reset(&mut self) -> Result<(), StorageError> {
        self.state.apply(CartAction::Reset);
        self.storage.clear().await
    }

    async fn persist(&self) -> Result<(), StorageError> {
        match serde_json::to_string(&self.state) {
            Ok(snapshot) => self.storage.save(&snapshot).await,
            Err(e) => {
                // Only non-finite prices can fail here; keep the previous snapshot.
                tracing::error!(error = %e, "Failed to serialize cart snapshot");
                Ok(())
            }
        }
    }
}

/// Parse a raw snapshot, falling back to the empty cart.
fn decode_snapshot(raw: &str) -> CartState {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Discarding malformed cart snapshot");
        CartState::default()
    })
}
