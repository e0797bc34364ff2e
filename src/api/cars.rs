use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_id, validate_page};
use super::{ApiError, ApiResponse, AppState, CarDto, MessageResponse, Page};
use crate::db::CarFilter;
use crate::services::CarInput;

#[derive(Deserialize)]
pub struct CarListQuery {
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

// ============================================================================
// Public catalogue
// ============================================================================

/// GET /cars
/// Available cars with optional search and price filters, paginated.
pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CarListQuery>,
) -> Result<Json<ApiResponse<Page<CarDto>>>, ApiError> {
    let page = validate_page(params.page)?;

    let filter = CarFilter {
        query: params.query,
        category: params.category,
        min_price: params.min_price,
        max_price: params.max_price,
        available_only: true,
    };

    let (cars, total_pages) = state
        .store()
        .list_cars(&filter, page, state.config.pagination.cars_per_page)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        items: cars.into_iter().map(CarDto::from).collect(),
        page,
        total_pages,
    })))
}

/// GET /cars/{id}
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CarDto>>, ApiError> {
    let id = validate_id(id)?;

    let car = state
        .store()
        .get_car(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Car", id))?;

    Ok(Json(ApiResponse::success(CarDto::from(car))))
}

// ============================================================================
// Admin fleet management
// ============================================================================

/// GET /admin/cars
/// The full fleet, unavailable cars included.
pub async fn admin_list_cars(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CarListQuery>,
) -> Result<Json<ApiResponse<Page<CarDto>>>, ApiError> {
    let page = validate_page(params.page)?;

    let filter = CarFilter {
        query: params.query,
        category: params.category,
        min_price: params.min_price,
        max_price: params.max_price,
        available_only: false,
    };

    let (cars, total_pages) = state
        .store()
        .list_cars(&filter, page, state.config.pagination.cars_per_page)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        items: cars.into_iter().map(CarDto::from).collect(),
        page,
        total_pages,
    })))
}

/// POST /admin/cars
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CarInput>,
) -> Result<Json<ApiResponse<CarDto>>, ApiError> {
    let car = state.inventory.add_car(payload).await?;
    Ok(Json(ApiResponse::success(CarDto::from(car))))
}

/// PUT /admin/cars/{id}
pub async fn update_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<CarInput>,
) -> Result<Json<ApiResponse<CarDto>>, ApiError> {
    let id = validate_id(id)?;
    let car = state.inventory.update_car(id, payload).await?;
    Ok(Json(ApiResponse::success(CarDto::from(car))))
}

/// DELETE /admin/cars/{id}
/// Refused with a conflict while the car has active bookings.
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id)?;
    state.inventory.delete_car(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Car deleted",
    ))))
}

/// POST /admin/cars/{id}/image
/// Multipart upload; expects a single `image` field.
pub async fn upload_car_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<CarDto>>, ApiError> {
    let id = validate_id(id)?;

    if state.store().get_car(id).await?.is_none() {
        return Err(ApiError::not_found("Car", id));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field
            .file_name()
            .ok_or_else(|| ApiError::validation("Image upload is missing a file name"))?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        let stored = state.images.save_upload(&file_name, &bytes).await?;
        let car = state.inventory.attach_image(id, &stored).await?;
        return Ok(Json(ApiResponse::success(CarDto::from(car))));
    }

    Err(ApiError::validation("No 'image' field in upload"))
}
