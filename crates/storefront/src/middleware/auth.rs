//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user (or an admin) in route
//! handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Where non-admins are sent when they open an admin view.
pub const ADMIN_REQUIRED_PATH: &str = "/unauthorized?message=admin%20login%20required";

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, returns a redirect to the login page that comes
/// back to the requested page afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in admin.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a request lacks the required identity.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in. Holds the page to return to after login.
    RedirectToLogin(String),
    /// Signed in without the admin role.
    AdminRequired,
    /// The session layer is missing.
    NoSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(return_to) => Redirect::to(&login_path(&return_to)).into_response(),
            Self::AdminRequired => Redirect::to(ADMIN_REQUIRED_PATH).into_response(),
            Self::NoSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Login page path that returns to `return_to` afterwards.
#[must_use]
pub fn login_path(return_to: &str) -> String {
    format!("/login?redirect={}", urlencoding::encode(return_to))
}

/// Page a JSON endpoint belongs to: `/api/shipping` is the `/shipping` page.
fn page_path(parts: &Parts) -> String {
    let path = parts.uri.path();
    match path.strip_prefix("/api") {
        Some(rest) if rest.starts_with('/') => rest.to_owned(),
        _ => path.to_owned(),
    }
}

async fn session_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::NoSession)?;

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await?
            .map(Self)
            .ok_or_else(|| AuthRejection::RedirectToLogin(page_path(parts)))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await? {
            Some(user) if user.is_admin => Ok(Self(user)),
            Some(user) => {
                tracing::warn!(user_id = %user.id, "Non-admin requested an admin view");
                Err(AuthRejection::AdminRequired)
            }
            None => Err(AuthRejection::AdminRequired),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.ok().flatten()))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
