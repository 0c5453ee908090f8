//! HTTP route handlers for storefront.
//!
//! Handlers return JSON view models, redirects, or [`AppError`](crate::error::AppError)
//! responses; markup is rendered by the page layer.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Health check
//!
//! # Cart
//! GET    /api/cart               - Cart page data
//! POST   /api/cart/items         - Add item or set its quantity (stock-checked)
//! DELETE /api/cart/items/{slug}  - Remove item
//! GET    /api/cart/count         - Cart count badge
//!
//! # Checkout (requires auth)
//! POST   /api/shipping           - Save shipping address
//! POST   /api/payment            - Save payment method
//! GET    /api/placeorder         - Order review, redirects to a missing step
//! POST   /api/placeorder         - Place order
//!
//! # Auth
//! GET    /login                  - Login page, skipped when signed in
//! POST   /login                  - Login action
//! POST   /register               - Register action
//! GET    /profile                - Profile form (requires auth)
//! PUT    /profile                - Update profile (requires auth)
//! POST   /logout                 - Logout action
//!
//! # Admin (requires admin)
//! GET    /api/admin/dashboard    - Sales summary and chart
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod profile;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", post(auth::register))
        .route("/profile", get(profile::show).put(profile::update))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::set_quantity))
        .route("/items/{slug}", delete(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/api/shipping", post(checkout::save_shipping))
        .route("/api/payment", post(checkout::save_payment))
        .route(
            "/api/placeorder",
            get(checkout::review).post(checkout::place),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(admin::dashboard))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Auth routes
        .merge(auth_routes())
        // Cart routes
        .nest("/api/cart", cart_routes())
        // Checkout steps
        .merge(checkout_routes())
        // Admin routes
        .nest("/api/admin", admin_routes())
}

/// Build the application: all routes with the session and trace layers.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
