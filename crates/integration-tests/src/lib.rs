//! Integration tests for Agar Shop.
//!
//! The storefront router runs in-process against [`MockShopApi`]; requests go
//! through `tower::ServiceExt::oneshot` and [`TestClient`] replays the session
//! cookie between them like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agar-shop-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use agar_shop_core::{Email, OrderId, ProductId, UserId};
use agar_shop_storefront::api::{
    AdminSummary, ApiError, CreatedOrder, Credentials, OrderRequest, ProductStock, ProfileUpdate,
    SalesPoint, ShopApi, SignUpRequest, SignedInUser,
};
use agar_shop_storefront::config::{ShopApiConfig, StorefrontConfig};
use agar_shop_storefront::routes;
use agar_shop_storefront::state::AppState;

/// Password of every seeded account.
pub const PASSWORD: &str = "123456";

/// Seeded customer.
pub const CUSTOMER_EMAIL: &str = "user@example.com";

/// Seeded admin.
pub const ADMIN_EMAIL: &str = "admin@example.com";

struct Account {
    password: String,
    user: SignedInUser,
}

/// In-process shop API with a small fixed catalogue.
#[derive(Default)]
pub struct MockShopApi {
    products: Mutex<HashMap<String, ProductStock>>,
    accounts: Mutex<Vec<Account>>,
    orders: Mutex<Vec<OrderRequest>>,
    fail_orders: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockShopApi {
    /// Catalogue of two shirts and one pair of pants, plus a customer and an
    /// admin account.
    #[must_use]
    pub fn seeded() -> Self {
        let api = Self::default();
        api.add_product("p1", "free-shirt", 70.0, 20);
        api.add_product("p2", "fit-shirt", 80.0, 20);
        api.add_product("p3", "slim-pants", 90.0, 2);
        api.add_account("u1", "John", CUSTOMER_EMAIL, false);
        api.add_account("u2", "Admin", ADMIN_EMAIL, true);
        api
    }

    pub fn add_product(&self, id: &str, slug: &str, price: f64, count_in_stock: u32) {
        lock(&self.products).insert(
            id.to_owned(),
            ProductStock {
                id: ProductId::new(id),
                slug: slug.to_owned(),
                name: slug.replace('-', " "),
                image: format!("/images/{slug}.jpg"),
                price,
                count_in_stock,
            },
        );
    }

    pub fn set_stock(&self, id: &str, count_in_stock: u32) {
        if let Some(product) = lock(&self.products).get_mut(id) {
            product.count_in_stock = count_in_stock;
        }
    }

    fn add_account(&self, id: &str, name: &str, email: &str, is_admin: bool) {
        lock(&self.accounts).push(Account {
            password: PASSWORD.to_owned(),
            user: SignedInUser {
                id: UserId::new(id),
                name: name.to_owned(),
                email: Email::parse(email).unwrap(),
                is_admin,
            },
        });
    }

    /// Make order creation fail until reset.
    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    /// Orders received so far.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        lock(&self.orders).clone()
    }
}

#[async_trait]
impl ShopApi for MockShopApi {
    async fn get_product(&self, id: &ProductId) -> Result<ProductStock, ApiError> {
        lock(&self.products)
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, ApiError> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "database unavailable".to_string(),
            });
        }
        let mut orders = lock(&self.orders);
        orders.push(order.clone());
        Ok(CreatedOrder {
            id: OrderId::new(format!("order-{}", orders.len())),
        })
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        let mut accounts = lock(&self.accounts);
        if accounts.iter().any(|a| a.user.email == request.email) {
            return Err(ApiError::Status {
                status: 422,
                message: "User exists already!".to_string(),
            });
        }
        let id = UserId::new(format!("u{}", accounts.len() + 1));
        accounts.push(Account {
            password: request.password.expose_secret().to_owned(),
            user: SignedInUser {
                id,
                name: request.name.clone(),
                email: request.email.clone(),
                is_admin: false,
            },
        });
        Ok(())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, ApiError> {
        lock(&self.accounts)
            .iter()
            .find(|a| {
                a.user.email == credentials.email
                    && a.password == credentials.password.expose_secret()
            })
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let mut accounts = lock(&self.accounts);
        let account = accounts
            .iter_mut()
            .find(|a| a.user.id == update.user_id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        account.user.name.clone_from(&update.name);
        account.user.email = update.email.clone();
        account.password = update.password.expose_secret().to_owned();
        Ok(())
    }

    async fn admin_summary(&self) -> Result<AdminSummary, ApiError> {
        let orders = lock(&self.orders);
        Ok(AdminSummary {
            orders_count: orders.len() as u64,
            products_count: lock(&self.products).len() as u64,
            users_count: lock(&self.accounts).len() as u64,
            orders_price: orders.iter().map(|o| o.totals.total_price).sum(),
            sales_data: vec![SalesPoint {
                month: "2024/03".to_owned(),
                total_sales: orders.iter().map(|o| o.totals.total_price).sum(),
            }],
        })
    }
}

/// Configuration for tests; nothing here is contacted.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("k3y-f0r-t3st1ng-0nly-9a8b7c6d5e4f3g2h"),
        api: ShopApiConfig {
            base_url: Url::parse("http://shop-api.invalid/api/").unwrap(),
            token: None,
            timeout: Duration::from_secs(5),
        },
        order_submission_timeout: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The storefront app over a shared mock API.
#[must_use]
pub fn test_app(api: Arc<MockShopApi>) -> Router {
    routes::app(AppState::new(test_config(), api))
}

/// A response, decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// `Location` header, for redirects.
    pub location: Option<String>,
    /// JSON body, or `Null` when the body is not JSON.
    pub json: Value,
}

/// One browser: keeps the session cookie between requests.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Sign in with the shared test password.
    pub async fn login(&mut self, email: &str) -> TestResponse {
        self.post(
            "/login",
            serde_json::json!({ "email": email, "password": PASSWORD }),
        )
        .await
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap_or_default()
                .to_owned();
            let has_value = pair.split_once('=').is_some_and(|(_, v)| !v.is_empty());
            self.cookie = has_value.then_some(pair);
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_owned());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            json,
        }
    }
}
