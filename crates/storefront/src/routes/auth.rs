//! Authentication route handlers.
//!
//! Handles login, registration and logout against the shop API. The signed-in
//! user is kept in the session as a [`CurrentUser`].

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use agar_shop_core::{Email, LoginInput, RegisterInput, Validate};

use super::cart::session_cart;
use crate::api::{Credentials, SignUpRequest};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Where to go after signing in.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

impl RedirectQuery {
    /// The requested target if it is a local path, otherwise `/`.
    #[must_use]
    pub fn target(&self) -> String {
        self.redirect
            .as_deref()
            .filter(|path| path.starts_with('/') && !path.starts_with("//"))
            .unwrap_or("/")
            .to_owned()
    }
}

// =============================================================================
// Views
// =============================================================================

/// Login page data.
#[derive(Debug, Clone, Serialize)]
pub struct LoginPage {
    /// Where a successful login will go.
    pub redirect: String,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub user: CurrentUser,
    pub redirect: String,
}

// =============================================================================
// Login / Register
// =============================================================================

/// Display login page, or skip it when already signed in.
#[instrument(skip(user))]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(&query.target()).into_response();
    }
    Json(LoginPage {
        redirect: query.target(),
    })
    .into_response()
}

/// Handle login.
#[instrument(skip(state, session, input), fields(email = %input.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RedirectQuery>,
    Json(input): Json<LoginInput>,
) -> Result<Json<SignedIn>> {
    input.check()?;
    let credentials = Credentials {
        email: parse_email(&input.email)?,
        password: SecretString::from(input.password),
    };

    let user = sign_in(&state, &session, &credentials).await?;
    Ok(Json(SignedIn {
        user,
        redirect: query.target(),
    }))
}

/// Handle registration: create the account, then sign in with it.
#[instrument(skip(state, session, input), fields(email = %input.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RedirectQuery>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<SignedIn>> {
    input.check()?;
    let email = parse_email(&input.email)?;
    let password = SecretString::from(input.password);

    state
        .api()
        .sign_up(&SignUpRequest {
            name: input.name.trim().to_owned(),
            email: email.clone(),
            password: password.clone(),
        })
        .await?;
    tracing::info!("Account created");

    let user = sign_in(&state, &session, &Credentials { email, password }).await?;
    Ok(Json(SignedIn {
        user,
        redirect: query.target(),
    }))
}

/// Check credentials with the shop API and store the user in the session.
///
/// # Errors
///
/// Returns the API error when the credentials are rejected, or a session
/// error if the user cannot be stored.
pub(super) async fn sign_in(
    state: &AppState,
    session: &Session,
    credentials: &Credentials,
) -> Result<CurrentUser> {
    let user = CurrentUser::from(state.api().sign_in(credentials).await?);

    // New session ID on privilege change
    session.cycle_id().await?;
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User signed in");

    Ok(user)
}

pub(super) fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Resets the cart, drops the persisted snapshot and the user, then destroys
/// the session.
pub async fn logout(session: Session) -> Redirect {
    let mut store = session_cart(session.clone()).await;
    if let Err(e) = store.reset().await {
        tracing::error!("Failed to clear cart: {}", e);
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/login")
}
