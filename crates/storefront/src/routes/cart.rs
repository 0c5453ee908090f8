//! Cart route handlers.
//!
//! The cart lives in the session as a serialized snapshot. Each request opens
//! a [`CartStore`] over that slot, applies at most one action, and returns the
//! resulting view.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use agar_shop_core::{CartState, LineItem, Money, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::services;
use crate::state::AppState;
use crate::store::{CartStore, SessionCartStorage};

/// Open the cart stored in this session.
pub async fn session_cart(session: Session) -> CartStore<SessionCartStorage> {
    CartStore::open(SessionCartStorage::new(session)).await
}

/// Cart page data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_items: Vec<LineItem>,
    /// Units across all lines.
    pub item_count: u64,
    /// Unrounded sum of quantity times price.
    pub subtotal: Money,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            cart_items: state.cart_items.clone(),
            item_count: state.item_count(),
            subtotal: state.subtotal(),
        }
    }
}

/// Header badge data.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add or update request. `quantity` is the absolute amount wanted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Display cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let store = session_cart(session).await;
    Json(CartView::from(store.state()))
}

/// Add an item or change its quantity.
#[instrument(skip(state, session))]
pub async fn set_quantity(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let mut store = session_cart(session).await;
    let cart = services::set_quantity(
        &mut store,
        state.api(),
        &request.product_id,
        request.quantity,
    )
    .await?;

    add_breadcrumb(
        "cart",
        "Set quantity",
        Some(&[
            ("product_id", request.product_id.as_str()),
            ("quantity", &request.quantity.to_string()),
        ]),
    );

    Ok(Json(CartView::from(cart)))
}

/// Remove an item.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(slug): Path<String>) -> Json<CartView> {
    let mut store = session_cart(session).await;
    let cart = services::remove_item(&mut store, &slug).await;
    Json(CartView::from(cart))
}

/// Cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCount> {
    let store = session_cart(session).await;
    Json(CartCount {
        count: store.state().item_count(),
    })
}
