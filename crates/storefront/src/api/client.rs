//! HTTP implementation of [`ShopApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::instrument;
use url::Url;

use agar_shop_core::ProductId;

use super::{
    AdminSummary, ApiError, CreatedOrder, Credentials, OrderRequest, ProductStock, ProfileUpdate,
    ShopApi, SignUpRequest, SignedInUser,
};
use crate::config::ShopApiConfig;

/// Longest slice of a response body copied into logs and error messages.
const MAX_BODY_EXCERPT: usize = 200;

/// JSON client for the shop API.
#[derive(Clone)]
pub struct HttpShopApi {
    inner: Arc<HttpShopApiInner>,
}

struct HttpShopApiInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpShopApi {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ShopApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpShopApiInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
            }),
        })
    }

    /// Build a request for a path relative to the base URL.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let builder = self.inner.client.request(method, url);
        Ok(match &self.inner.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::warn!(status = %status, message = %message, "Shop API returned non-success status");
            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    #[instrument(skip(self))]
    async fn get_product(&self, id: &ProductId) -> Result<ProductStock, ApiError> {
        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        self.execute(self.request(Method::GET, &path)?).await
    }

    #[instrument(skip(self, order), fields(items = order.order_items.len(), total = order.totals.total_price))]
    async fn create_order(&self, order: &OrderRequest) -> Result<CreatedOrder, ApiError> {
        let request = self.request(Method::POST, "orders")?.json(order);
        self.execute(request).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        let request = self.request(Method::POST, "auth/signup")?.json(request);
        self.execute::<IgnoredAny>(request).await.map(|_| ())
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, ApiError> {
        let request = self.request(Method::POST, "auth/signin")?.json(credentials);
        self.execute(request).await
    }

    #[instrument(skip(self, update), fields(user_id = %update.user_id))]
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let request = self.request(Method::PUT, "auth/update")?.json(update);
        self.execute::<IgnoredAny>(request).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn admin_summary(&self) -> Result<AdminSummary, ApiError> {
        self.execute(self.request(Method::GET, "admin/summary")?)
            .await
    }
}

/// Pick the error message out of a failed response.
///
/// The API answers errors with `{"message": "..."}`; anything else falls
/// back to the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| excerpt(body), str::to_owned)
        })
}

fn excerpt(body: &str) -> String {
    body.chars().take(MAX_BODY_EXCERPT).collect()
}
