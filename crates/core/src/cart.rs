//! Shopping cart state and its reducer.
//!
//! The cart is a plain value: [`CartState`] holds the line items, the
//! shipping address and the payment method, and [`reduce`] folds a
//! [`CartAction`] into a new state. The reducer performs no I/O; the caller
//! persists the resulting snapshot after each dispatch.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroU32;
//!
//! use agar_shop_core::{CartAction, CartState, LineItem, ProductId, reduce};
//!
//! let item = LineItem {
//!     product_id: ProductId::new("p1"),
//!     slug: "free-shirt".to_owned(),
//!     name: "Free Shirt".to_owned(),
//!     image: "/images/shirt1.jpg".to_owned(),
//!     price: 70.0,
//!     quantity: NonZeroU32::MIN,
//!     count_in_stock: 20,
//! };
//!
//! let state = reduce(CartState::default(), CartAction::AddItem(item));
//! assert_eq!(state.item_count(), 1);
//!
//! let state = reduce(state, CartAction::Reset);
//! assert!(state.is_empty());
//! ```

use std::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Money, ProductId};

/// One product entry in the cart.
///
/// `price` and `count_in_stock` are the values the product lookup returned
/// when the entry was last added or updated. They are not refreshed on their
/// own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product document ID in the shop API.
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    /// URL slug; unique key within the cart.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Image path or URL.
    pub image: String,
    /// Unit price.
    pub price: Money,
    /// Number of units.
    pub quantity: NonZeroU32,
    /// Stock level known at the time of the last add/update.
    pub count_in_stock: u32,
}

impl LineItem {
    /// Returns the same item with a different quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: NonZeroU32) -> Self {
        Self { quantity, ..self }
    }

    /// Unrounded `quantity * price`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        f64::from(self.quantity.get()) * self.price
    }
}

/// Destination for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    /// Street address.
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// The aggregate of line items, shipping address and payment method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// At most one entry per slug, in insertion order.
    #[serde(default)]
    pub cart_items: Vec<LineItem>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_object_as_none"
    )]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub payment_method: Option<String>,
}

impl CartState {
    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    /// Total number of units across all line items (the header badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart_items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Unrounded sum of `quantity * price`, as shown on the cart page.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.cart_items
            .iter()
            .fold(0.0, |acc, item| acc + item.line_total())
    }

    /// Look up a line item by slug.
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&LineItem> {
        self.cart_items.iter().find(|item| item.slug == slug)
    }

    /// Apply an action in place. See [`reduce`].
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::AddItem(item) => {
                match self.cart_items.iter_mut().find(|i| i.slug == item.slug) {
                    Some(existing) => *existing = item,
                    None => self.cart_items.push(item),
                }
            }
            CartAction::RemoveItem { slug } => {
                self.cart_items.retain(|item| item.slug != slug);
            }
            CartAction::SaveShippingAddress(address) => {
                self.shipping_address = Some(address);
            }
            CartAction::SavePaymentMethod(method) => {
                self.payment_method = Some(method);
            }
            CartAction::ClearItems => self.cart_items.clear(),
            CartAction::Reset => *self = Self::default(),
        }
    }
}

/// The closed set of cart mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum CartAction {
    /// Upsert by slug. An existing entry is replaced in place, so the caller
    /// passes the absolute quantity, not an increment.
    #[serde(rename = "CART_ADD_ITEM")]
    AddItem(LineItem),
    /// Remove the entry with this slug; no-op if absent.
    #[serde(rename = "CART_REMOVE_ITEM")]
    RemoveItem { slug: String },
    /// Replace the shipping address wholesale.
    #[serde(rename = "SAVE_SHIPPING_ADDRESS")]
    SaveShippingAddress(ShippingAddress),
    #[serde(rename = "SAVE_PAYMENT_METHOD")]
    SavePaymentMethod(String),
    /// Empty the line items; address and payment method are kept.
    #[serde(rename = "CART_CLEAR_ITEMS")]
    ClearItems,
    /// Back to the empty cart.
    #[serde(rename = "CART_RESET")]
    Reset,
}

impl CartAction {
    /// Action name as it appears in snapshots and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "CART_ADD_ITEM",
            Self::RemoveItem { .. } => "CART_REMOVE_ITEM",
            Self::SaveShippingAddress(_) => "SAVE_SHIPPING_ADDRESS",
            Self::SavePaymentMethod(_) => "SAVE_PAYMENT_METHOD",
            Self::ClearItems => "CART_CLEAR_ITEMS",
            Self::Reset => "CART_RESET",
        }
    }
}

/// Pure cart reducer: `(state, action) -> state'`.
///
/// Every action is total and deterministic; replaying the same actions from
/// the same state always yields the same result.
#[must_use]
pub fn reduce(mut state: CartState, action: CartAction) -> CartState {
    state.apply(action);
    state
}

/// Older snapshots store an unset shipping address as `{}`.
fn empty_object_as_none<'de, D>(deserializer: D) -> Result<Option<ShippingAddress>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Older snapshots store an unset payment method as `""`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn item(slug: &str, price: Money, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(format!("id-{slug}")),
            slug: slug.to_owned(),
            name: slug.to_uppercase(),
            image: format!("/images/{slug}.jpg"),
            price,
            quantity: qty(quantity),
            count_in_stock: 10,
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

    #[test]
    fn test_add_appends_new_slugs_in_order() {
        let state = reduce(CartState::default(), CartAction::AddItem(item("a", 1.0, 1)));
        let state = reduce(state, CartAction::AddItem(item("b", 2.0, 1)));

        let slugs: Vec<_> = state.cart_items.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, ["a", "b"]);
    }

    #[test]
    fn test_add_existing_slug_replaces_quantity() {
        let state = reduce(CartState::default(), CartAction::AddItem(item("x", 5.0, 2)));
        let state = reduce(state, CartAction::AddItem(item("x", 5.0, 5)));

        assert_eq!(state.cart_items.len(), 1);
        assert_eq!(state.find("x").unwrap().quantity.get(), 5);
    }

    #[test]
    fn test_add_existing_slug_keeps_position() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 1.0, 1)));
        state.apply(CartAction::AddItem(item("b", 1.0, 1)));
        state.apply(CartAction::AddItem(item("a", 1.0, 3)));

        assert_eq!(state.cart_items[0].slug, "a");
        assert_eq!(state.cart_items[0].quantity.get(), 3);
        assert_eq!(state.cart_items[1].slug, "b");
    }

    #[test]
    fn test_add_is_idempotent() {
        let once = reduce(CartState::default(), CartAction::AddItem(item("x", 5.0, 2)));
        let twice = reduce(once.clone(), CartAction::AddItem(item("x", 5.0, 2)));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_missing_slug_is_noop() {
        let state = reduce(CartState::default(), CartAction::AddItem(item("a", 1.0, 1)));
        let after = reduce(
            state.clone(),
            CartAction::RemoveItem {
                slug: "missing".to_owned(),
            },
        );
        assert_eq!(state, after);
    }

    #[test]
    fn test_remove_drops_matching_entry() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 1.0, 1)));
        state.apply(CartAction::AddItem(item("b", 1.0, 1)));
        state.apply(CartAction::RemoveItem {
            slug: "a".to_owned(),
        });

        assert!(state.find("a").is_none());
        assert!(state.find("b").is_some());
    }

    #[test]
    fn test_clear_items_keeps_address_and_payment() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 1.0, 1)));
        state.apply(CartAction::SaveShippingAddress(address()));
        state.apply(CartAction::SavePaymentMethod("PayPal".to_owned()));
        state.apply(CartAction::ClearItems);

        assert!(state.is_empty());
        assert_eq!(state.shipping_address, Some(address()));
        assert_eq!(state.payment_method.as_deref(), Some("PayPal"));
    }

    #[test]
    fn test_save_shipping_address_replaces_wholesale() {
        let mut state = CartState::default();
        state.apply(CartAction::SaveShippingAddress(address()));
        let moved = ShippingAddress {
            city: "Darkhan".to_owned(),
            ..address()
        };
        state.apply(CartAction::SaveShippingAddress(moved.clone()));
        assert_eq!(state.shipping_address, Some(moved));
    }

    #[test]
    fn test_reset_empties_everything() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 1.0, 1)));
        state.apply(CartAction::SaveShippingAddress(address()));
        state.apply(CartAction::SavePaymentMethod("Stripe".to_owned()));
        state.apply(CartAction::Reset);

        assert_eq!(state, CartState::default());
        assert!(state.shipping_address.is_none());
        assert!(state.payment_method.is_none());
    }

    #[test]
    fn test_item_count_and_subtotal() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 10.5, 2)));
        state.apply(CartAction::AddItem(item("b", 3.0, 3)));

        assert_eq!(state.item_count(), 5);
        assert_eq!(state.subtotal(), 30.0);
    }

    #[test]
    fn test_item_count_beyond_u32() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 1.0, 3_000_000_000)));
        state.apply(CartAction::AddItem(item("b", 1.0, 3_000_000_000)));

        assert_eq!(state.item_count(), 6_000_000_000);
    }

    #[test]
    fn test_snapshot_uses_wire_field_names() {
        let mut state = CartState::default();
        state.apply(CartAction::AddItem(item("a", 10.0, 2)));
        state.apply(CartAction::SaveShippingAddress(address()));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["cartItems"][0]["_id"], "id-a");
        assert_eq!(json["cartItems"][0]["countInStock"], 10);
        assert_eq!(json["shippingAddress"]["postalCode"], "14200");
        assert!(json.get("paymentMethod").is_none());
    }

    #[test]
    fn test_snapshot_with_blank_payment_method_reads_as_unset() {
        let state: CartState =
            serde_json::from_str(r#"{"cartItems":[],"paymentMethod":""}"#).unwrap();
        assert!(state.payment_method.is_none());
    }

    #[test]
    fn test_snapshot_with_empty_address_object_reads_as_unset() {
        let state: CartState =
            serde_json::from_str(r#"{"cartItems":[],"shippingAddress":{},"paymentMethod":""}"#)
                .unwrap();
        assert_eq!(state, CartState::default());
    }

    #[test]
    fn test_snapshot_with_partial_address_is_rejected() {
        let raw = r#"{"cartItems":[],"shippingAddress":{"city":"Erdenet"}}"#;
        assert!(serde_json::from_str::<CartState>(raw).is_err());
    }

    #[test]
    fn test_zero_quantity_snapshot_is_rejected() {
        let raw = r#"{"cartItems":[{"_id":"1","slug":"a","name":"A","image":"","price":1,"quantity":0,"countInStock":1}]}"#;
        assert!(serde_json::from_str::<CartState>(raw).is_err());
    }

    #[test]
    fn test_action_serde_uses_action_names() {
        let action = CartAction::RemoveItem {
            slug: "a".to_owned(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "CART_REMOVE_ITEM");
        assert_eq!(json["type"], action.name());
        assert_eq!(json["payload"]["slug"], "a");

        let reset: CartAction = serde_json::from_str(r#"{"type":"CART_RESET"}"#).unwrap();
        assert_eq!(reset, CartAction::Reset);
    }
}
