//! Session cart store.
//!
//! [`CartStore`] owns one session's [`CartState`](agar_shop_core::CartState)
//! and mirrors it into a [`CartStorage`] slot after every dispatch. The
//! reduction itself is the pure reducer from the core crate; everything that
//! touches storage lives here.

mod cart_store;
mod storage;

pub use cart_store::CartStore;
pub use storage::{CartStorage, MemoryCartStorage, SessionCartStorage, StorageError};
