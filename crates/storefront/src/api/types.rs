//! Wire types for the shop API.
//!
//! Field names follow the API's JSON (camelCase, document IDs as `_id`).

use std::num::NonZeroU32;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use agar_shop_core::{
    Email, LineItem, Money, OrderId, OrderTotals, ProductId, ShippingAddress, UserId,
};

use crate::models::CurrentUser;

/// Current price and stock for a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Money,
    pub count_in_stock: u32,
}

impl ProductStock {
    /// Build a cart line from this lookup result.
    #[must_use]
    pub fn into_line_item(self, quantity: NonZeroU32) -> LineItem {
        LineItem {
            product_id: self.id,
            slug: self.slug,
            name: self.name,
            image: self.image,
            price: self.price,
            quantity,
            count_in_stock: self.count_in_stock,
        }
    }
}

/// Body of the order creation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Response of the order creation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    #[serde(rename = "_id")]
    pub id: OrderId,
}

/// Email and password for sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// Body of the sign-up call.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: Email,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// Body of the profile update call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// User returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<SignedInUser> for CurrentUser {
    fn from(user: SignedInUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Sales figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub orders_count: u64,
    pub products_count: u64,
    pub users_count: u64,
    pub orders_price: Money,
    #[serde(default)]
    pub sales_data: Vec<SalesPoint>,
}

/// Total sales for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPoint {
    /// Month label, e.g. `2024/03`.
    #[serde(rename = "_id")]
    pub month: String,
    pub total_sales: Money,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
