//! Cart mutations and order placement.
//!
//! Every quantity change looks the product up first and is refused when the
//! shop no longer has enough stock. Any error leaves the cart as it was.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use agar_shop_core::{
    CartAction, CartState, FieldErrors, LineItem, OrderId, OrderTotals, PaymentInput, ProductId,
    ShippingAddress, Validate, compute_totals, validation::parse_quantity,
};

use super::submission::SubmissionRegistry;
use crate::api::{ApiError, OrderRequest, ShopApi};
use crate::store::{CartStorage, CartStore};

/// Errors from the checkout workflow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Form input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Requested more units than the shop has.
    #[error("only {available} of {slug} in stock, {requested} requested")]
    OutOfStock {
        slug: String,
        requested: u32,
        available: u32,
    },

    /// An earlier checkout step has not been completed.
    #[error("checkout incomplete: {0:?} step missing")]
    Incomplete(CheckoutStep),

    /// An order for this session is already being submitted.
    #[error("order submission already in progress")]
    SubmissionInFlight,

    /// Shop API call failed.
    #[error("shop API error: {0}")]
    Api(#[from] ApiError),
}

/// Checkout wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutStep {
    Cart,
    Shipping,
    Payment,
    PlaceOrder,
}

impl CheckoutStep {
    /// Page path for this step.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cart => "/cart",
            Self::Shipping => "/shipping",
            Self::Payment => "/payment",
            Self::PlaceOrder => "/placeorder",
        }
    }
}

/// First step the cart still needs, or [`CheckoutStep::PlaceOrder`] when the
/// order can be submitted.
#[must_use]
pub fn checkout_step(state: &CartState) -> CheckoutStep {
    if state.cart_items.is_empty() {
        CheckoutStep::Cart
    } else if state.shipping_address.is_none() {
        CheckoutStep::Shipping
    } else if state.payment_method.is_none() {
        CheckoutStep::Payment
    } else {
        CheckoutStep::PlaceOrder
    }
}

/// Set a product's quantity in the cart.
///
/// The product is always looked up again, whether it is new to the cart or
/// already there, and the cart line takes the fresh price and stock level.
///
/// # Errors
///
/// Returns `Validation` for a zero quantity, `OutOfStock` when the shop has
/// fewer units than requested, or `Api` when the lookup fails.
#[instrument(skip(store, api, product_id), fields(product_id = %product_id))]
pub async fn set_quantity<'a, S: CartStorage>(
    store: &'a mut CartStore<S>,
    api: &dyn ShopApi,
    product_id: &ProductId,
    quantity: u32,
) -> Result<&'a CartState, CheckoutError> {
    let quantity = parse_quantity(quantity)?;
    let product = api.get_product(product_id).await?;

    if product.count_in_stock < quantity.get() {
        tracing::warn!(
            slug = %product.slug,
            requested = quantity.get(),
            available = product.count_in_stock,
            "Sorry. Product is out of stock"
        );
        return Err(CheckoutError::OutOfStock {
            slug: product.slug,
            requested: quantity.get(),
            available: product.count_in_stock,
        });
    }

    Ok(store
        .dispatch(CartAction::AddItem(product.into_line_item(quantity)))
        .await)
}

/// Remove a product from the cart. Unknown slugs are ignored.
pub async fn remove_item<'a, S: CartStorage>(
    store: &'a mut CartStore<S>,
    slug: &str,
) -> &'a CartState {
    store
        .dispatch(CartAction::RemoveItem {
            slug: slug.to_owned(),
        })
        .await
}

/// Validate and store the shipping address.
///
/// # Errors
///
/// Returns `Validation` listing every blank field.
pub async fn save_shipping_address<S: CartStorage>(
    store: &mut CartStore<S>,
    address: ShippingAddress,
) -> Result<&CartState, CheckoutError> {
    address.check()?;
    Ok(store
        .dispatch(CartAction::SaveShippingAddress(address))
        .await)
}

/// Validate and store the payment method.
///
/// # Errors
///
/// Returns `Incomplete(Shipping)` when no address has been saved yet, or
/// `Validation` for a blank method.
pub async fn save_payment_method<S: CartStorage>(
    store: &mut CartStore<S>,
    input: PaymentInput,
) -> Result<&CartState, CheckoutError> {
    if store.state().shipping_address.is_none() {
        return Err(CheckoutError::Incomplete(CheckoutStep::Shipping));
    }
    input.check()?;
    Ok(store
        .dispatch(CartAction::SavePaymentMethod(
            input.payment_method.trim().to_owned(),
        ))
        .await)
}

/// What the place-order page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_items: Vec<LineItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Totals for display. Works on any cart, complete or not.
#[must_use]
pub fn order_summary(state: &CartState) -> OrderSummary {
    OrderSummary {
        order_items: state.cart_items.clone(),
        shipping_address: state.shipping_address.clone(),
        payment_method: state.payment_method.clone(),
        totals: compute_totals(&state.cart_items),
    }
}

/// A successfully created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// Confirmation page path.
    pub redirect: String,
}

/// Submit the cart as an order.
///
/// Only one submission per `submission_key` runs at a time. On success the
/// cart items are cleared; address and payment method stay for next time.
///
/// # Errors
///
/// Returns `Incomplete` when a checkout step is missing,
/// `SubmissionInFlight` when another submission holds the key, or `Api`
/// when order creation fails. The cart is unchanged on error.
#[instrument(skip(store, api, submissions))]
pub async fn place_order<S: CartStorage>(
    store: &mut CartStore<S>,
    api: &dyn ShopApi,
    submissions: &SubmissionRegistry,
    submission_key: &str,
) -> Result<PlacedOrder, CheckoutError> {
    let request = order_request(store.state()).map_err(CheckoutError::Incomplete)?;

    let guard = submissions
        .acquire(submission_key)
        .await
        .ok_or(CheckoutError::SubmissionInFlight)?;
    let created = match api.create_order(&request).await {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(error = %e, "Order creation failed");
            guard.release().await;
            return Err(e.into());
        }
    };

    store.dispatch(CartAction::ClearItems).await;
    guard.release().await;
    tracing::info!(
        order_id = %created.id,
        total_price = request.totals.total_price,
        "Order placed"
    );

    Ok(PlacedOrder {
        redirect: format!("/order/{}", created.id),
        order_id: created.id,
    })
}

fn order_request(state: &CartState) -> Result<OrderRequest, CheckoutStep> {
    match (
        checkout_step(state),
        &state.shipping_address,
        &state.payment_method,
    ) {
        (CheckoutStep::PlaceOrder, Some(shipping_address), Some(payment_method)) => {
            Ok(OrderRequest {
                order_items: state.cart_items.clone(),
                shipping_address: shipping_address.clone(),
                payment_method: payment_method.clone(),
                totals: compute_totals(&state.cart_items),
            })
        }
        (step, ..) => Err(step),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::api::{
        AdminSummary, CreatedOrder, Credentials, ProductStock, ProfileUpdate, SignUpRequest,
        SignedInUser,
    };
    use crate::store::MemoryCartStorage;

    #[derive(Default)]
    struct StubApi {
        products: HashMap<String, ProductStock>,
        reject_orders: bool,
        orders: Mutex<Vec<OrderRequest>>,
    }

    impl StubApi {
        fn with_product(mut self, id: &str, price: f64, count_in_stock: u32) -> Self {
            self.products.insert(
                id.to_owned(),
                ProductStock {
                    id: ProductId::new(id),
                    slug: format!("slug-{id}"),
                    name: format!("Product {id}"),
                    image: String::new(),
                    price,
                    count_in_stock,
                },
            );
            self
        }

        fn set_stock(&mut self, id: &str, count_in_stock: u32) {
            if let Some(product) = self.products.get_mut(id) {
                product.count_in_stock = count_in_stock;
            }
        }
    }

    #[async_trait]
    impl ShopApi for StubApi {
        async fn get_product(&self, id: &ProductId) -> Result<ProductStock, ApiError> {
            self.products
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
        }

        async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, ApiError> {
            if self.reject_orders {
                return Err(ApiError::Status {
                    status: 500,
                    message: "Order failed".to_string(),
                });
            }
            let mut orders = self.orders.lock().unwrap();
            orders.push(order.clone());
            Ok(CreatedOrder {
                id: OrderId::new(format!("order-{}", orders.len())),
            })
        }

        async fn sign_up(&self, _request: &SignUpRequest) -> Result<(), ApiError> {
            Err(unsupported())
        }

        async fn sign_in(&self, _credentials: &Credentials) -> Result<SignedInUser, ApiError> {
            Err(unsupported())
        }

        async fn update_profile(&self, _update: &ProfileUpdate) -> Result<(), ApiError> {
            Err(unsupported())
        }

        async fn admin_summary(&self) -> Result<AdminSummary, ApiError> {
            Err(unsupported())
        }
    }

    fn unsupported() -> ApiError {
        ApiError::Status {
            status: 501,
            message: "not used by checkout".to_string(),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Bold Bat".to_owned(),
            address: "Peace Ave 17".to_owned(),
            city: "Ulaanbaatar".to_owned(),
            postal_code: "14200".to_owned(),
            country: "Mongolia".to_owned(),
        }
    }

    fn payment(method: &str) -> PaymentInput {
        PaymentInput {
            payment_method: method.to_owned(),
        }
    }

    async fn empty_store() -> CartStore<MemoryCartStorage> {
        CartStore::open(MemoryCartStorage::new()).await
    }

    async fn ready_store(api: &StubApi) -> CartStore<MemoryCartStorage> {
        let mut store = empty_store().await;
        set_quantity(&mut store, api, &ProductId::new("p1"), 2)
            .await
            .unwrap();
        save_shipping_address(&mut store, address()).await.unwrap();
        save_payment_method(&mut store, payment("PayPal"))
            .await
            .unwrap();
        store
    }

    fn registry() -> SubmissionRegistry {
        SubmissionRegistry::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_set_quantity_uses_lookup_values() {
        let api = StubApi::default().with_product("p1", 70.0, 5);
        let mut store = empty_store().await;

        let state = set_quantity(&mut store, &api, &ProductId::new("p1"), 3)
            .await
            .unwrap();

        let item = state.find("slug-p1").unwrap();
        assert_eq!(item.quantity.get(), 3);
        assert_eq!(item.price, 70.0);
        assert_eq!(item.count_in_stock, 5);
    }

    #[tokio::test]
    async fn test_set_quantity_rejects_over_stock() {
        let api = StubApi::default().with_product("p1", 70.0, 2);
        let mut store = empty_store().await;

        let err = set_quantity(&mut store, &api, &ProductId::new("p1"), 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::OutOfStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_update_revalidates_against_current_stock() {
        let mut api = StubApi::default().with_product("p1", 70.0, 5);
        let mut store = empty_store().await;
        set_quantity(&mut store, &api, &ProductId::new("p1"), 2)
            .await
            .unwrap();

        api.set_stock("p1", 3);
        let err = set_quantity(&mut store, &api, &ProductId::new("p1"), 4)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OutOfStock { .. }));
        assert_eq!(store.state().find("slug-p1").unwrap().quantity.get(), 2);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_is_validation_error() {
        let api = StubApi::default().with_product("p1", 70.0, 5);
        let mut store = empty_store().await;

        let err = set_quantity(&mut store, &api, &ProductId::new("p1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_quantity_unknown_product() {
        let api = StubApi::default();
        let mut store = empty_store().await;

        let err = set_quantity(&mut store, &api, &ProductId::new("nope"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Api(ApiError::NotFound(_))));
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address_is_not_saved() {
        let mut store = empty_store().await;
        let err = save_shipping_address(
            &mut store,
            ShippingAddress {
                city: String::new(),
                ..address()
            },
        )
        .await
        .unwrap_err();

        let CheckoutError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("city").is_some());
        assert!(store.state().shipping_address.is_none());
    }

    #[tokio::test]
    async fn test_payment_requires_shipping_first() {
        let mut store = empty_store().await;
        let err = save_payment_method(&mut store, payment("PayPal"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Incomplete(CheckoutStep::Shipping)
        ));
    }

    #[tokio::test]
    async fn test_blank_payment_method_rejected() {
        let mut store = empty_store().await;
        save_shipping_address(&mut store, address()).await.unwrap();
        let err = save_payment_method(&mut store, payment("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert!(store.state().payment_method.is_none());
    }

    #[tokio::test]
    async fn test_checkout_step_order() {
        let api = StubApi::default().with_product("p1", 10.0, 5);
        let mut store = empty_store().await;
        assert_eq!(checkout_step(store.state()), CheckoutStep::Cart);

        set_quantity(&mut store, &api, &ProductId::new("p1"), 1)
            .await
            .unwrap();
        assert_eq!(checkout_step(store.state()), CheckoutStep::Shipping);

        save_shipping_address(&mut store, address()).await.unwrap();
        assert_eq!(checkout_step(store.state()), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Payment.path(), "/payment");

        save_payment_method(&mut store, payment("Stripe"))
            .await
            .unwrap();
        assert_eq!(checkout_step(store.state()), CheckoutStep::PlaceOrder);
    }

    #[tokio::test]
    async fn test_order_summary_without_payment_method() {
        let api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = empty_store().await;
        set_quantity(&mut store, &api, &ProductId::new("p1"), 2)
            .await
            .unwrap();

        let summary = order_summary(store.state());
        assert!(summary.payment_method.is_none());
        assert_eq!(summary.totals.items_price, 200.0);
        assert_eq!(summary.totals.shipping_price, 15.0);
        assert_eq!(summary.totals.tax_price, 30.0);
        assert_eq!(summary.totals.total_price, 245.0);
    }

    #[tokio::test]
    async fn test_place_order_clears_items_and_keeps_checkout_details() {
        let api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = ready_store(&api).await;

        let placed = place_order(&mut store, &api, &registry(), "session-1")
            .await
            .unwrap();

        assert_eq!(placed.order_id.as_str(), "order-1");
        assert_eq!(placed.redirect, "/order/order-1");
        assert!(store.state().is_empty());
        assert_eq!(store.state().shipping_address, Some(address()));
        assert_eq!(store.state().payment_method.as_deref(), Some("PayPal"));

        let orders = api.orders.lock().unwrap();
        assert_eq!(orders[0].totals.total_price, 245.0);
        assert_eq!(orders[0].payment_method, "PayPal");
    }

    #[tokio::test]
    async fn test_place_order_without_payment_method_goes_to_payment() {
        let api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = empty_store().await;
        set_quantity(&mut store, &api, &ProductId::new("p1"), 1)
            .await
            .unwrap();
        save_shipping_address(&mut store, address()).await.unwrap();

        let err = place_order(&mut store, &api, &registry(), "session-1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Incomplete(CheckoutStep::Payment)
        ));
        assert!(api.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart_and_allows_retry() {
        let mut api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = ready_store(&api).await;
        let registry = registry();
        api.reject_orders = true;

        let err = place_order(&mut store, &api, &registry, "session-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Api(_)));
        assert_eq!(store.state().item_count(), 2);

        api.reject_orders = false;
        assert!(
            place_order(&mut store, &api, &registry, "session-1")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_concurrent_submission_refused() {
        let api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = ready_store(&api).await;
        let registry = registry();
        let _held = registry.acquire("session-1").await.unwrap();

        let err = place_order(&mut store, &api, &registry, "session-1")
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::SubmissionInFlight));
        assert_eq!(store.state().item_count(), 2);
        assert!(api.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_order_frees_the_session() {
        let api = StubApi::default().with_product("p1", 100.0, 5);
        let mut store = ready_store(&api).await;
        let registry = registry();

        place_order(&mut store, &api, &registry, "session-1")
            .await
            .unwrap();

        assert!(registry.acquire("session-1").await.is_some());
    }
}
