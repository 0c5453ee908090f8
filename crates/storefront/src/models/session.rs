//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use agar_shop_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user and
/// decide access to admin views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User's ID in the shop API.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Whether the user may open admin views.
    pub is_admin: bool,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized cart snapshot.
    pub const CART: &str = "cart";
}
