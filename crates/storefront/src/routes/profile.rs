//! Profile route handlers.

use axum::{Json, extract::State};
use secrecy::SecretString;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use agar_shop_core::{Email, ProfileInput, Validate};

use super::auth::{parse_email, sign_in};
use crate::api::{Credentials, ProfileUpdate};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Current profile values for the form.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub name: String,
    pub email: Email,
}

impl From<CurrentUser> for ProfileView {
    fn from(user: CurrentUser) -> Self {
        Self {
            name: user.name,
            email: user.email,
        }
    }
}

/// Result of a profile update.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdated {
    pub user: CurrentUser,
    pub message: &'static str,
}

/// Display the profile form.
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn show(RequireAuth(user): RequireAuth) -> Json<ProfileView> {
    Json(ProfileView::from(user))
}

/// Update name, email and password, then sign in again with the new
/// credentials so the session reflects the stored profile.
#[instrument(skip(state, session, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ProfileUpdated>> {
    input.check()?;
    let email = parse_email(&input.email)?;
    let password = SecretString::from(input.password);

    state
        .api()
        .update_profile(&ProfileUpdate {
            user_id: user.id,
            name: input.name.trim().to_owned(),
            email: email.clone(),
            password: password.clone(),
        })
        .await?;

    let user = sign_in(&state, &session, &Credentials { email, password }).await?;
    Ok(Json(ProfileUpdated {
        user,
        message: "Profile updated successfully",
    }))
}
