//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use thiserror::Error;

use agar_shop_core::FieldErrors;

use crate::api::ApiError;
use crate::services::{CheckoutError, CheckoutStep};
use crate::store::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Form input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Requested quantity exceeds stock.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// A checkout step must be completed first.
    #[error("Checkout incomplete: {0:?}")]
    Incomplete(CheckoutStep),

    /// An order is already being submitted for this session.
    #[error("Order submission in progress")]
    SubmissionInFlight,

    /// Shop API operation failed.
    #[error("Shop API error: {0}")]
    Api(#[from] ApiError),

    /// Session read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(errors) => Self::Validation(errors),
            CheckoutError::OutOfStock { .. } => Self::OutOfStock(err.to_string()),
            CheckoutError::Incomplete(step) => Self::Incomplete(step),
            CheckoutError::SubmissionInFlight => Self::SubmissionInFlight,
            CheckoutError::Api(e) => Self::Api(e),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Session(e) => Self::Session(e),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl AppError {
    /// Whether this is a server-side fault worth reporting.
    const fn is_server_fault(&self) -> bool {
        match self {
            Self::Session(_) => true,
            Self::Api(err) => !is_client_error(err),
            _ => false,
        }
    }
}

/// API errors caused by the request itself, whose message the user should see.
const fn is_client_error(err: &ApiError) -> bool {
    match err {
        ApiError::NotFound(_) | ApiError::Unauthorized(_) => true,
        ApiError::Status { status, .. } => *status >= 400 && *status < 500,
        ApiError::Http(_) | ApiError::Url(_) | ApiError::Parse(_) => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message, errors) = match self {
            Self::Incomplete(step) => return Redirect::to(step.path()).into_response(),
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Please correct the highlighted fields".to_string(),
                Some(errors),
            ),
            Self::OutOfStock(_) => (
                StatusCode::CONFLICT,
                "Sorry. Product is out of stock".to_string(),
                None,
            ),
            Self::SubmissionInFlight => (
                StatusCode::CONFLICT,
                "Your order is already being placed".to_string(),
                None,
            ),
            Self::Api(err) => match &err {
                ApiError::NotFound(_) => (StatusCode::NOT_FOUND, err.user_message(), None),
                ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, err.user_message(), None),
                _ if is_client_error(&err) => (StatusCode::BAD_REQUEST, err.user_message(), None),
                // Don't expose internal error details to clients
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                    None,
                ),
            },
            Self::Session(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
        };

        (status, Json(ErrorBody { message, errors })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("slug", "free-shirt")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
