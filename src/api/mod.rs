use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{BookingEngine, CarImageService, InventoryService, ReportingService};

pub mod auth;
mod bookings;
mod cars;
mod error;
mod reports;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub config: Config,

    pub engine: Arc<BookingEngine>,

    pub inventory: Arc<InventoryService>,

    pub reporting: Arc<ReportingService>,

    pub images: Arc<CarImageService>,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let engine = Arc::new(BookingEngine::new(store.clone()));
    let inventory = Arc::new(InventoryService::new(
        store.clone(),
        engine.clone(),
        &config.uploads,
    ));
    let reporting = Arc::new(ReportingService::new(store.clone()));
    let images = Arc::new(CarImageService::new(&config.uploads));

    Ok(Arc::new(AppState {
        store,
        config,
        engine,
        inventory,
        reporting,
        images,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let uploads_path = state.config.uploads.uploads_path.clone();
    let cors_origins = state.config.server.cors_allowed_origins.clone();
    let max_upload_bytes = state.config.uploads.max_upload_bytes;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_ttl_minutes,
        )));

    let admin_routes = Router::new()
        .route("/dashboard", get(reports::dashboard))
        .route("/reports", get(reports::reports))
        .route("/customers", get(reports::list_customers))
        .route("/cars", get(cars::admin_list_cars))
        .route("/cars", post(cars::create_car))
        .route("/cars/{id}", put(cars::update_car))
        .route("/cars/{id}", delete(cars::delete_car))
        .route("/cars/{id}/image", post(cars::upload_car_image))
        .route("/bookings", get(bookings::admin_list_bookings))
        .route("/bookings/{id}/approve", post(bookings::approve_booking))
        .route_layer(middleware::from_fn(auth::require_admin));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/bookings", get(bookings::my_bookings))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/cars", get(cars::list_cars))
        .route("/cars/{id}", get(cars::get_car))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/uploads", ServeDir::new(uploads_path))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
