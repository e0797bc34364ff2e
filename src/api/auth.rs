use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{validate_email, validate_full_name, validate_password, validate_phone};
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::db::NewUser;
use crate::domain::Identity;

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session's user id into an [`Identity`] request extension.
/// Requests without a live session get a 401 envelope.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Err(ApiError::unauthorized());
    };

    // The session may outlive the account.
    let Some(user) = state.store().get_user_by_id(user_id).await? else {
        let _ = session.flush().await;
        return Err(ApiError::unauthorized());
    };

    request.extensions_mut().insert(Identity {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(request).await)
}

/// Gates the admin subtree. Runs after [`auth_middleware`], so the
/// identity extension is always present here.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.role.is_admin() => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        )),
        None => Err(ApiError::unauthorized()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a customer account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let email = validate_email(&payload.email)?.to_lowercase();
    let full_name = validate_full_name(&payload.full_name)?.to_string();
    validate_password(&payload.password)?;
    let phone = match payload.phone.as_deref() {
        Some(p) => Some(validate_phone(p)?.to_string()),
        None => None,
    };

    if state.store().get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation(
            "Email already registered. Please use a different email.",
        ));
    }

    let user = state
        .store()
        .create_user(
            NewUser {
                email,
                full_name,
                phone,
                password: payload.password,
            },
            &state.config.security,
        )
        .await?;

    tracing::info!(user_id = user.id, "Customer registered");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/login
/// Authenticate by email and password, establishing a session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .verify_credentials(&payload.email.to_lowercase(), &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current account details (requires authentication).
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(identity.user_id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
