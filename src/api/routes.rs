//! Route table. All role gates are applied here so the full access policy
//! is visible in one place.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::api::handlers::{artifacts, auth, health, uploads, users};
use crate::api::middleware::auth::{require_role, Operation};
use crate::api::openapi::ApiDoc;
use crate::api::SharedState;

pub fn create_router(state: SharedState) -> Router {
    let gate = |operation: Operation| {
        middleware::from_fn_with_state((state.auth.clone(), operation), require_role)
    };

    // Reads are public; writes go through the capability table.
    let artifact_routes = Router::new()
        .route("/", get(artifacts::list_artifacts))
        .route("/categories", get(artifacts::get_categories))
        .route("/eras", get(artifacts::get_eras))
        .route("/stats", get(artifacts::get_stats))
        .route(
            "/:id",
            get(artifacts::get_artifact)
                .merge(put(artifacts::update_artifact).layer(gate(Operation::UpdateArtifact)))
                .merge(delete(artifacts::delete_artifact).layer(gate(Operation::DeleteArtifact))),
        )
        .merge(
            Router::new()
                .route("/", post(artifacts::create_artifact))
                .layer(gate(Operation::CreateArtifact)),
        );

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/:id/reset-password", post(users::reset_password))
        .layer(gate(Operation::ManageUsers));

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(gate(Operation::ViewProfile)),
        );

    let upload_routes = Router::new()
        .route(
            "/image",
            post(uploads::upload_image).layer(gate(Operation::UploadImage)),
        )
        .route(
            "/images",
            get(uploads::list_images).layer(gate(Operation::BrowseImages)),
        )
        .route(
            "/image/:filename",
            delete(uploads::delete_image).layer(gate(Operation::DeleteImage)),
        )
        // Headroom over the file limit for multipart framing.
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_BYTES + 64 * 1024));

    Router::new()
        .nest("/api/artifacts", artifact_routes)
        .nest("/api/users", user_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/upload", upload_routes)
        .route("/api/openapi.json", get(serve_openapi))
        .route("/health", get(health::health_check))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
