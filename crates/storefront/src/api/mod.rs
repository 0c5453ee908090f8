//! Shop API client.
//!
//! # Architecture
//!
//! - The shop API is the source of truth for products, orders and users;
//!   the storefront keeps only the session and the cart snapshot
//! - [`ShopApi`] is the seam handlers depend on, so tests can substitute an
//!   in-process implementation
//! - [`HttpShopApi`] talks JSON over `reqwest`
//!
//! # Endpoints
//!
//! ```text
//! GET  products/{id}     price and stock lookup
//! POST orders            order creation
//! POST auth/signup       account creation
//! POST auth/signin       credential check, returns the user
//! PUT  auth/update       profile update
//! GET  admin/summary     dashboard figures
//! ```

mod client;
pub mod types;

pub use client::HttpShopApi;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use agar_shop_core::ProductId;

/// Errors that can occur when calling the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response. `message` is the API's own message
    /// when it sent one.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Error message.
        message: String,
    },
}

impl ApiError {
    /// Message suitable for showing to the user.
    ///
    /// API-provided messages pass through; transport and parse failures are
    /// replaced with a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::Status { message, .. } => message.clone(),
            Self::Http(_) | Self::Url(_) | Self::Parse(_) => {
                "Shop service is unavailable, please try again".to_string()
            }
        }
    }
}

/// Operations the storefront needs from the shop API.
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// Current price and stock for a product.
    async fn get_product(&self, id: &ProductId) -> Result<ProductStock, ApiError>;

    /// Create an order; returns its ID.
    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, ApiError>;

    /// Create an account.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError>;

    /// Check credentials and return the user.
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, ApiError>;

    /// Update name, email and password.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError>;

    /// Figures for the admin dashboard.
    async fn admin_summary(&self) -> Result<AdminSummary, ApiError>;
}
