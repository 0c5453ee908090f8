//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::ShopApi;
use crate::config::StorefrontConfig;
use crate::services::SubmissionRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shop API client, the submission registry and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: Arc<dyn ShopApi>,
    submissions: SubmissionRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `api` - Shop API implementation
    #[must_use]
    pub fn new(config: StorefrontConfig, api: Arc<dyn ShopApi>) -> Self {
        let submissions = SubmissionRegistry::new(config.order_submission_timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                submissions,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shop API.
    #[must_use]
    pub fn api(&self) -> &dyn ShopApi {
        self.inner.api.as_ref()
    }

    /// In-flight order submissions.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionRegistry {
        &self.inner.submissions
    }
}
