//! Business logic services

pub mod activities;
pub mod reports;
pub mod storage;
pub mod tools;
pub mod users;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub tools: tools::ToolsService,
    pub activities: activities::ActivitiesService,
    pub users: users::UsersService,
    pub reports: reports::ReportsService,
    pub storage: storage::ImageStorage,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let storage = storage::ImageStorage::new(&config.storage);
        Self {
            tools: tools::ToolsService::new(repository.clone(), storage.clone()),
            activities: activities::ActivitiesService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), storage.clone(), config.auth.clone()),
            reports: reports::ReportsService::new(repository.clone(), config.report.clone()),
            storage,
            repository,
        }
    }

    /// Database round-trip for the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await.map_err(AppError::from)
    }
}
