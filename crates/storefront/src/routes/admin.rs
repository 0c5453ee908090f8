//! Admin dashboard route handlers.
//!
//! The dashboard page tracks its one fetch with a small reducer
//! (`FETCH_REQUEST` → `FETCH_SUCCESS` | `FETCH_FAIL`); the handler drives it
//! through a single summary request and returns the resulting view.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agar_shop_core::Money;

use crate::api::AdminSummary;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Fetch lifecycle of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    pub loading: bool,
    pub summary: Option<AdminSummary>,
    pub error: Option<String>,
}

/// Dashboard fetch events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardAction {
    #[serde(rename = "FETCH_REQUEST")]
    FetchRequest,
    #[serde(rename = "FETCH_SUCCESS")]
    FetchSuccess(AdminSummary),
    #[serde(rename = "FETCH_FAIL")]
    FetchFail(String),
}

/// Pure dashboard reducer.
///
/// A new request clears the previous error but keeps the last summary on
/// screen until fresh data arrives.
#[must_use]
pub fn reduce(state: DashboardState, action: DashboardAction) -> DashboardState {
    match action {
        DashboardAction::FetchRequest => DashboardState {
            loading: true,
            error: None,
            ..state
        },
        DashboardAction::FetchSuccess(summary) => DashboardState {
            loading: false,
            summary: Some(summary),
            error: None,
        },
        DashboardAction::FetchFail(error) => DashboardState {
            loading: false,
            error: Some(error),
            ..state
        },
    }
}

/// Sales chart series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesChart {
    /// Month labels, e.g. `2024/03`.
    pub labels: Vec<String>,
    /// Total sales per month.
    pub data: Vec<Money>,
}

impl From<&AdminSummary> for SalesChart {
    fn from(summary: &AdminSummary) -> Self {
        let (labels, data) = summary
            .sales_data
            .iter()
            .map(|point| (point.month.clone(), point.total_sales))
            .unzip();
        Self { labels, data }
    }
}

/// Dashboard page data.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub state: DashboardState,
    pub chart: SalesChart,
}

impl From<DashboardState> for DashboardView {
    fn from(state: DashboardState) -> Self {
        let chart = state
            .summary
            .as_ref()
            .map(SalesChart::from)
            .unwrap_or_default();
        Self { state, chart }
    }
}

/// Admin dashboard.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> (StatusCode, Json<DashboardView>) {
    let dashboard = reduce(DashboardState::default(), DashboardAction::FetchRequest);

    let (status, action) = match state.api().admin_summary().await {
        Ok(summary) => (StatusCode::OK, DashboardAction::FetchSuccess(summary)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load dashboard summary");
            (StatusCode::BAD_GATEWAY, DashboardAction::FetchFail(e.user_message()))
        }
    };

    (status, Json(DashboardView::from(reduce(dashboard, action))))
}
