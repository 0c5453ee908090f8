//! Persistence slots for the cart snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

use crate::models::session_keys;

/// Errors reading or writing the snapshot slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// A key/value slot holding the serialized cart snapshot.
///
/// The store reads it once when it opens and writes it after every
/// dispatch. Implementations never interpret the contents.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Read the raw snapshot, if one was saved.
    async fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the raw snapshot.
    async fn save(&self, snapshot: &str) -> Result<(), StorageError>;

    /// Remove the snapshot.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Snapshot slot in the tower-sessions session under the `cart` key.
#[derive(Debug, Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CartStorage for SessionCartStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        // A value of the wrong JSON type is treated like corrupt data, not
        // a storage failure.
        match self.session.get::<String>(session_keys::CART).await {
            Ok(value) => Ok(value),
            Err(tower_sessions::session::Error::SerdeJson(e)) => {
                tracing::warn!(error = %e, "Cart slot holds a non-string value");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        self.session.insert(session_keys::CART, snapshot).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.session.remove_value(session_keys::CART).await?;
        Ok(())
    }
}

/// In-memory snapshot slot.
///
/// Clones share the same slot, so a test can keep a handle and inspect what
/// the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with a raw snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot.into()))),
        }
    }

    /// Current raw contents.
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, value: Option<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot())
    }

    async fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        self.set(Some(snapshot.to_owned()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.set(None);
        Ok(())
    }
}
