//! User directory handlers. Every route here is admin-only; the gate is
//! applied in routes.rs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::dto::{empty_string_as_none, total_pages, ApiResponse, PaginationQuery};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::user::{Role, User};
use crate::services::user_service::{NewUser, UserService, UserUpdate};

/// A user as exposed over the API. The password hash never leaves the
/// server even though `User` already skips it during serialization.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            department: user.department,
            position: user.position,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetPasswordData {
    pub password: String,
}

pub async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListData>>> {
    let page = query.pagination.page();
    let limit = query.pagination.limit();

    let service = UserService::new(state.db.clone());
    let (users, total) = service
        .list(query.search.as_deref(), query.role, page, limit)
        .await?;

    Ok(Json(ApiResponse::data(UserListData {
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
        page,
        total_pages: total_pages(total, limit),
    })))
}

pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let user = UserService::new(state.db.clone()).create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user.into(), "User created")),
    ))
}

pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = UserService::new(state.db.clone()).get(id).await?;
    Ok(Json(ApiResponse::data(user.into())))
}

pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = UserService::new(state.db.clone()).update(id, req).await?;
    Ok(Json(ApiResponse::with_message(user.into(), "User updated")))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    UserService::new(state.db.clone())
        .delete(id, auth.user_id)
        .await?;
    Ok(Json(ApiResponse::message("User deleted")))
}

/// Generate a fresh random password for the user and return it once.
pub async fn reset_password(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResetPasswordData>>> {
    let password = UserService::new(state.db.clone()).reset_password(id).await?;
    Ok(Json(ApiResponse::with_message(
        ResetPasswordData { password },
        "Password reset",
    )))
}
