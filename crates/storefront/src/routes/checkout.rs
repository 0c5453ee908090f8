//! Checkout route handlers: shipping, payment and place order.
//!
//! All of these require a signed-in user. Each step answers with the page
//! the wizard should show next.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use agar_shop_core::{PaymentInput, ShippingAddress};

use super::cart::session_cart;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::{self, CheckoutStep, PlacedOrder, order_summary};
use crate::state::AppState;

/// Result of completing a wizard step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    /// Page to show next.
    pub redirect: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Save the shipping address.
#[instrument(skip(session, user, address), fields(user_id = %user.id))]
pub async fn save_shipping(
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<StepView>> {
    let mut store = session_cart(session).await;
    let cart = services::save_shipping_address(&mut store, address).await?;

    Ok(Json(StepView {
        redirect: CheckoutStep::Payment.path(),
        shipping_address: cart.shipping_address.clone(),
        payment_method: None,
    }))
}

/// Save the payment method.
#[instrument(skip(session, user), fields(user_id = %user.id))]
pub async fn save_payment(
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(input): Json<PaymentInput>,
) -> Result<Json<StepView>> {
    let mut store = session_cart(session).await;
    let cart = services::save_payment_method(&mut store, input).await?;

    Ok(Json(StepView {
        redirect: CheckoutStep::PlaceOrder.path(),
        shipping_address: None,
        payment_method: cart.payment_method.clone(),
    }))
}

/// Order review page data.
///
/// Redirects to the shipping or payment step when either is still missing,
/// even for an empty cart. An empty cart with both set gets its (zero)
/// summary.
#[instrument(skip(session, user), fields(user_id = %user.id))]
pub async fn review(RequireAuth(user): RequireAuth, session: Session) -> Response {
    let store = session_cart(session).await;
    let state = store.state();
    if state.shipping_address.is_none() {
        return Redirect::to(CheckoutStep::Shipping.path()).into_response();
    }
    if state.payment_method.is_none() {
        return Redirect::to(CheckoutStep::Payment.path()).into_response();
    }
    Json(order_summary(state)).into_response()
}

/// Place the order.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Json<PlacedOrder>> {
    let submission_key = session
        .id()
        .map_or_else(|| format!("user:{}", user.id), |id| id.to_string());

    let mut store = session_cart(session).await;
    let placed = services::place_order(
        &mut store,
        state.api(),
        state.submissions(),
        &submission_key,
    )
    .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", placed.order_id.as_str())]),
    );

    Ok(Json(placed))
}
