use axum::{Json, extract::{Query, State}};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::validate_page;
use super::{ApiError, ApiResponse, AppState, BookingDto, Page, UserDto};
use crate::services::reporting::{DashboardStats, ReportSummary};

const RECENT_BOOKINGS_LIMIT: u64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_bookings: Vec<BookingDto>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let stats = state.reporting.dashboard().await?;
    let recent = state
        .reporting
        .recent_bookings(RECENT_BOOKINGS_LIMIT)
        .await?;

    Ok(Json(ApiResponse::success(DashboardResponse {
        stats,
        recent_bookings: recent.into_iter().map(BookingDto::from).collect(),
    })))
}

/// GET /admin/reports
/// Daily activity for the trailing week, status breakdown, popular cars,
/// and total revenue over approved and completed bookings.
pub async fn reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ReportSummary>>, ApiError> {
    let summary = state.reporting.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// GET /admin/customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    let page = validate_page(params.page)?;

    let (customers, total_pages) = state
        .store()
        .list_customers(page, state.config.pagination.customers_per_page)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        items: customers.into_iter().map(UserDto::from).collect(),
        page,
        total_pages,
    })))
}
