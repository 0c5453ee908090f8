//! Agar Shop Core - cart state, order totals and form validation.
//!
//! This crate holds the parts of the shop that have rules of their own:
//! - [`cart`] - the cart state and its pure reducer
//! - [`totals`] - items, shipping, tax and grand total for a cart
//! - [`validation`] - field-level checks for every form the shop submits
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! sessions, no HTTP clients. Persistence and the remote shop API live in the
//! `storefront` crate, which calls into this one.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and emails, plus the money rounding rule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod totals;
pub mod types;
pub mod validation;

pub use cart::{CartAction, CartState, LineItem, ShippingAddress, reduce};
pub use totals::{OrderTotals, compute_totals};
pub use types::*;
pub use validation::{
    FieldErrors, LoginInput, PaymentInput, ProfileInput, RegisterInput, Validate,
};
