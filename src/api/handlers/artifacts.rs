//! Artifact catalog handlers.
//!
//! Listing, lookup and the dashboard aggregates are public; create/update
//! are curator operations and delete is admin-only (enforced in routes.rs
//! through the capability table).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::dto::{empty_string_as_none, total_pages, ApiResponse, PaginationQuery};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::artifact::{Artifact, PreservationStatus, ValueLevel};
use crate::services::artifact_filter::ArtifactFilter;
use crate::services::artifact_service::{ArtifactService, ArtifactUpdate, NewArtifact};
use crate::services::stats_service::{DashboardStats, StatsService};

#[derive(Debug, Default, Deserialize)]
pub struct ListArtifactsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub era: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub value_level: Option<ValueLevel>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub preservation_status: Option<PreservationStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub available_min: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub available_amount: Option<i32>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtifactListData {
    pub artifacts: Vec<Artifact>,
    pub total: i64,
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

/// List artifacts with optional filters and pagination
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/artifacts",
    tag = "artifacts",
    responses(
        (status = 200, description = "Page of matching artifacts", body = ArtifactListData),
    )
)]
pub async fn list_artifacts(
    State(state): State<SharedState>,
    Query(query): Query<ListArtifactsQuery>,
) -> Result<Json<ApiResponse<ArtifactListData>>> {
    let filter = ArtifactFilter::new(
        query.search,
        query.category,
        query.era,
        query.value_level,
        query.preservation_status,
        query.available_min,
        query.available_amount,
    );
    let page = query.pagination.page();
    let limit = query.pagination.limit();

    let service = ArtifactService::new(state.db.clone());
    let (artifacts, total) = service.list(&filter, page, limit).await?;

    Ok(Json(ApiResponse::data(ArtifactListData {
        artifacts,
        total,
        page,
        total_pages: total_pages(total, limit),
    })))
}

/// Get artifact by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/artifacts",
    tag = "artifacts",
    responses(
        (status = 200, description = "The artifact", body = Artifact),
        (status = 404, description = "Artifact not found"),
    )
)]
pub async fn get_artifact(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Artifact>>> {
    let artifact = ArtifactService::new(state.db.clone()).get(id).await?;
    Ok(Json(ApiResponse::data(artifact)))
}

/// Create an artifact
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/artifacts",
    tag = "artifacts",
    request_body = NewArtifact,
    responses(
        (status = 201, description = "Created artifact", body = Artifact),
        (status = 409, description = "Artifact code already exists"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_artifact(
    State(state): State<SharedState>,
    Json(req): Json<NewArtifact>,
) -> Result<(StatusCode, Json<ApiResponse<Artifact>>)> {
    let artifact = ArtifactService::new(state.db.clone()).create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(artifact, "Artifact created")),
    ))
}

/// Apply a partial update to an artifact
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/artifacts",
    tag = "artifacts",
    request_body = ArtifactUpdate,
    responses(
        (status = 200, description = "Updated artifact", body = Artifact),
        (status = 400, description = "Empty update payload"),
        (status = 404, description = "Artifact not found"),
        (status = 409, description = "Artifact code already exists"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_artifact(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArtifactUpdate>,
) -> Result<Json<ApiResponse<Artifact>>> {
    // Rejected before the rule engine ever sees it.
    if req.is_empty() {
        return Err(AppError::Validation(
            "Update payload must not be empty".to_string(),
        ));
    }

    let artifact = ArtifactService::new(state.db.clone()).update(id, req).await?;
    Ok(Json(ApiResponse::with_message(artifact, "Artifact updated")))
}

/// Delete an artifact
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/artifacts",
    tag = "artifacts",
    responses(
        (status = 200, description = "Artifact deleted"),
        (status = 404, description = "Artifact not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_artifact(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    ArtifactService::new(state.db.clone()).delete(id).await?;
    Ok(Json(ApiResponse::message("Artifact deleted")))
}

/// Distinct category values for filter UIs
pub async fn get_categories(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let categories = ArtifactService::new(state.db.clone()).categories().await?;
    Ok(Json(ApiResponse::data(categories)))
}

/// Distinct era values for filter UIs
pub async fn get_eras(State(state): State<SharedState>) -> Result<Json<ApiResponse<Vec<String>>>> {
    let eras = ArtifactService::new(state.db.clone()).eras().await?;
    Ok(Json(ApiResponse::data(eras)))
}

/// Dashboard statistics
#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/artifacts",
    tag = "artifacts",
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardStats),
    )
)]
pub async fn get_stats(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<DashboardStats>>> {
    let stats = StatsService::new(state.db.clone()).dashboard().await?;
    Ok(Json(ApiResponse::data(stats)))
}
