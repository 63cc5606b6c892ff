//! Authentication and authorization middleware.
//!
//! Extracts and validates the bearer JWT, then checks the caller's role
//! against a declarative capability table (operation -> allowed roles).
//! Handlers and services stay role-agnostic: the policy lives here and is
//! checked exactly once per request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::Role;
use crate::services::auth_service::{AuthService, Claims};

/// Extension that holds authenticated user information
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// A role-gated operation exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateArtifact,
    UpdateArtifact,
    DeleteArtifact,
    ManageUsers,
    UploadImage,
    BrowseImages,
    DeleteImage,
    ViewProfile,
}

/// The capability table. Curators maintain the catalog; only admins delete
/// records or manage accounts; researchers and visitors are read-only.
pub fn allowed_roles(operation: Operation) -> &'static [Role] {
    match operation {
        Operation::CreateArtifact
        | Operation::UpdateArtifact
        | Operation::UploadImage
        | Operation::DeleteImage => &[Role::Admin, Role::Curator],
        Operation::DeleteArtifact | Operation::ManageUsers => &[Role::Admin],
        Operation::BrowseImages | Operation::ViewProfile => {
            &[Role::Admin, Role::Curator, Role::Researcher, Role::Visitor]
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Middleware requiring a valid token whose role is allowed to perform the
/// given operation. On success the request carries an [`AuthExtension`].
pub async fn require_role(
    State((auth_service, operation)): State<(Arc<AuthService>, Operation)>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(&request) else {
        return AppError::Authentication("Missing authorization header".to_string())
            .into_response();
    };

    let claims = match auth_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    if !allowed_roles(operation).contains(&claims.role) {
        return AppError::Authorization(format!(
            "Role {} is not allowed to perform this operation",
            claims.role
        ))
        .into_response();
    }

    request.extensions_mut().insert(AuthExtension::from(claims));
    next.run(request).await
}
