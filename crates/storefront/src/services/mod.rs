//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Stock-checked cart mutations and order placement
//! - `submission` - One in-flight order submission per session

pub mod checkout;
pub mod submission;

pub use checkout::{
    CheckoutError, CheckoutStep, OrderSummary, PlacedOrder, checkout_step, order_summary,
    place_order, remove_item, save_payment_method, save_shipping_address, set_quantity,
};
pub use submission::{SubmissionGuard, SubmissionRegistry};
