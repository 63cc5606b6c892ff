use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collection_keeper_backend::api::{routes::create_router, AppState};
use collection_keeper_backend::services::auth_service::AuthService;
use collection_keeper_backend::{db, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "collection_keeper_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    tracing::info!("connecting to database");
    let db = db::create_pool(&config.database_url).await?;

    tracing::info!("running migrations");
    sqlx::migrate!("./migrations").run(&db).await?;

    provision_admin_user(&db).await?;

    let state = Arc::new(AppState::new(config.clone(), db));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("listening on {}", config.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the initial admin account when the user table is empty, so a
/// fresh deployment is reachable. The password must be changed afterwards.
async fn provision_admin_user(db: &PgPool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let password_hash = AuthService::hash_password("admin123")?;
    sqlx::query(
        "INSERT INTO users (username, password_hash, email, full_name, role)
         VALUES ($1, $2, $3, $4, 'admin')",
    )
    .bind("admin")
    .bind(&password_hash)
    .bind("admin@museum.local")
    .bind("System Administrator")
    .execute(db)
    .await?;

    tracing::warn!("created default admin account (admin/admin123), change the password");
    Ok(())
}
