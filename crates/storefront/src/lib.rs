//! Agar Shop Storefront library.
//!
//! This crate provides the storefront backend as a library, allowing it to
//! be tested and reused. It hosts one cart per browser session, talks to the
//! shop API for products, orders and accounts, and serves JSON to the page
//! layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
