use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_id, validate_page};
use super::{ApiError, ApiResponse, AppState, BookingDto, MessageResponse, Page};
use crate::domain::{BookingStatus, Identity};
use crate::services::{BookingRequest, CancelOutcome};

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

// ============================================================================
// Customer endpoints
// ============================================================================

/// POST /bookings
/// Submit a booking request; rejected with 409 when the dates collide
/// with an existing pending or approved booking on the car.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let car_id = validate_id(payload.car_id)?;

    let booking = state
        .engine
        .try_create(
            identity,
            BookingRequest {
                car_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(BookingDto::from(booking))))
}

/// GET /bookings
/// The caller's bookings, newest first.
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Page<BookingDto>>>, ApiError> {
    let page = validate_page(params.page)?;

    let (bookings, total_pages) = state
        .store()
        .bookings_for_user(
            identity.user_id,
            page,
            state.config.pagination.bookings_per_page,
        )
        .await?;

    Ok(Json(ApiResponse::success(Page {
        items: bookings.into_iter().map(BookingDto::from).collect(),
        page,
        total_pages,
    })))
}

/// POST /bookings/{id}/cancel
/// Owner or admin only. Cancelling twice is a no-op.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id)?;

    let message = match state.engine.cancel(identity, id).await? {
        CancelOutcome::Cancelled => "Booking cancelled",
        CancelOutcome::AlreadyCancelled => "Booking was already cancelled",
    };

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

// ============================================================================
// Admin endpoints
// ============================================================================

/// GET /admin/bookings?status=
pub async fn admin_list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Page<BookingDto>>>, ApiError> {
    let page = validate_page(params.page)?;

    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
            ApiError::validation(format!(
                "Unknown status '{raw}'. Expected one of: pending, approved, cancelled, completed."
            ))
        })?),
        None => None,
    };

    let (bookings, total_pages) = state
        .store()
        .list_bookings(status, page, state.config.pagination.bookings_per_page)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        items: bookings.into_iter().map(BookingDto::from).collect(),
        page,
        total_pages,
    })))
}

/// POST /admin/bookings/{id}/approve
/// Only pending bookings can be approved.
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let id = validate_id(id)?;
    let booking = state.engine.approve(id).await?;
    Ok(Json(ApiResponse::success(BookingDto::from(booking))))
}
