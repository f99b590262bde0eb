//! Hundi Backend Library
//!
//! Donor registry and collection-round lifecycle for hundi (donation box)
//! rounds. Exposed as a library for the binary and the integration tests.

pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod models;
pub mod repositories;
pub mod response;
pub mod services;
pub mod stores;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use services::DonorService;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub donor_repo: Arc<DonorRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub donation_repo: Arc<DonationRepository>,
    pub user_repo: Arc<UserRepository>,
    pub donor_service: Arc<DonorService>,
}

impl AppState {
    /// Create a new AppState backed by PostgreSQL
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());
        let donor_repo = Arc::new(DonorRepository::new(pool.clone()));
        let group_repo = Arc::new(GroupRepository::new(pool.clone()));
        let donation_repo = Arc::new(DonationRepository::new(pool.clone()));

        let donor_service = Arc::new(DonorService::new(
            donor_repo.clone(),
            group_repo.clone(),
            donation_repo.clone(),
            Arc::new(database.clone()),
        ));

        Self {
            database,
            donor_repo,
            group_repo,
            donation_repo,
            user_repo: Arc::new(UserRepository::new(pool)),
            donor_service,
        }
    }
}
