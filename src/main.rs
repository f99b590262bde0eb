//! Hundi Backend Service
//!
//! Connects to PostgreSQL, applies migrations and makes sure the default
//! collection groups exist so the first donor registration has somewhere
//! to land.

use hundi_backend::database::{create_pool, run_migrations};
use hundi_backend::models::Actor;
use hundi_backend::{AppConfig, AppError, AppResult, AppState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hundi_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    info!("Hundi backend starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    info!("Connecting to database...");
    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;
    info!(
        "Database pool ready (max connections: {})",
        config.database.max_connections
    );

    info!("Running migrations from {}", config.migrations_path);
    run_migrations(&pool, Some(&config.migrations_path))
        .await
        .map_err(|e| {
            error!("Database migration failed: {}", e);
            AppError::Database(e)
        })?;

    let state = AppState::new(pool);

    match config.bootstrap_owner_id {
        Some(owner) => {
            let owner = state
                .user_repo
                .find_by_id(owner)
                .await?
                .ok_or_else(|| {
                    AppError::Config(format!("BOOTSTRAP_OWNER_ID {} is not a known user", owner))
                })?;
            let groups = state
                .donor_service
                .ensure_default_groups(&Actor::from(&owner))
                .await?;
            info!(
                "Default groups ready: {}",
                groups
                    .iter()
                    .map(|g| g.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        None => warn!(
            "BOOTSTRAP_OWNER_ID not set; default groups will be created by the first donor registration"
        ),
    }

    info!("Hundi backend initialised");
    Ok(())
}
