//! Login, registration and the current-user profile endpoint.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::dto::ApiResponse;
use crate::api::handlers::users::UserResponse;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::user::Role;
use crate::services::user_service::{NewUser, UserService};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginData {
    pub token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginData),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let (user, issued) = state
        .auth
        .authenticate(req.username.trim(), &req.password)
        .await?;
    tracing::info!(username = %user.username, "user logged in");

    Ok(Json(ApiResponse::data(LoginData {
        token: issued.token,
        expires_in: issued.expires_in,
        user: user.into(),
    })))
}

/// Self-service registration. New accounts always start as visitors;
/// an admin promotes them afterwards if needed.
pub async fn register(
    State(state): State<SharedState>,
    Json(mut req): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    req.role = Some(Role::Visitor);
    let user = UserService::new(state.db.clone()).create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user.into(), "Account created")),
    ))
}

/// Current user's profile, resolved from the bearer token
pub async fn me(
    State(state): State<SharedState>,
    Extension(auth_ctx): Extension<AuthExtension>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.auth.current_user(auth_ctx.user_id).await?;
    Ok(Json(ApiResponse::data(user.into())))
}
