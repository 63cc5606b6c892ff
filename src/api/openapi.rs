//! OpenAPI document, served as JSON at /api/openapi.json.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers;
use crate::models::artifact::{Artifact, PreservationStatus, ValueLevel};
use crate::models::user::Role;
use crate::services::artifact_service::{ArtifactUpdate, NewArtifact};
use crate::services::stats_service::{DashboardStats, RecentArtifact, ValueLevelCount};
use crate::services::user_service::{NewUser, UserUpdate};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Collection Keeper API",
        description = "Museum collection management backend"
    ),
    paths(
        handlers::artifacts::list_artifacts,
        handlers::artifacts::get_artifact,
        handlers::artifacts::create_artifact,
        handlers::artifacts::update_artifact,
        handlers::artifacts::delete_artifact,
        handlers::artifacts::get_stats,
        handlers::auth::login,
    ),
    components(schemas(
        Artifact,
        ValueLevel,
        PreservationStatus,
        Role,
        NewArtifact,
        ArtifactUpdate,
        NewUser,
        UserUpdate,
        DashboardStats,
        RecentArtifact,
        ValueLevelCount,
        handlers::artifacts::ArtifactListData,
        handlers::auth::LoginRequest,
        handlers::auth::LoginData,
        handlers::users::UserResponse,
        handlers::users::UserListData,
        handlers::users::ResetPasswordData,
        handlers::uploads::UploadedImage,
        handlers::uploads::ImageEntry,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "artifacts", description = "Artifact catalog"),
        (name = "auth", description = "Authentication"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_artifact_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/artifacts"));
        assert!(json.contains("bearer_auth"));
    }
}
