//! Order total calculation.
//!
//! The order API recomputes these figures on its side and treats any
//! mismatch as a consistency failure, so the constants and the order of
//! rounding here are fixed.

use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::types::{Money, round2};

/// Orders whose items price is strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = 200.0;

/// Shipping fee charged at or below the threshold.
pub const FLAT_SHIPPING_FEE: Money = 15.0;

/// Tax applied to the items price.
pub const TAX_RATE: Money = 0.15;

/// Price breakdown for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

/// Compute the price breakdown for a set of line items.
///
/// 1. `items = round2(Σ quantity × price)`
/// 2. `shipping = 0` if `items > 200`, else `15`
/// 3. `tax = round2(items × 0.15)`
/// 4. `total = round2(items + shipping + tax)`
///
/// ```
/// use agar_shop_core::compute_totals;
///
/// let totals = compute_totals(&[]);
/// assert_eq!(totals.shipping_price, 15.0);
/// assert_eq!(totals.total_price, 15.0);
/// ```
#[must_use]
pub fn compute_totals(items: &[LineItem]) -> OrderTotals {
    let items_price = round2(
        items
            .iter()
            .fold(0.0, |acc, item| acc + item.line_total()),
    );
    let shipping_price = shipping_for(items_price);
    let tax_price = round2(items_price * TAX_RATE);
    let total_price = round2(items_price + shipping_price + tax_price);

    OrderTotals {
        items_price,
        shipping_price,
        tax_price,
        total_price,
    }
}

/// Shipping fee for an already rounded items price.
#[must_use]
pub fn shipping_for(items_price: Money) -> Money {
    if items_price > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING_FEE
    }
}
