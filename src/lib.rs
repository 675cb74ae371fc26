//! SIYANMAT equipment usage server
//!
//! REST JSON API tracking tools (peralatan), the activities (kegiatan) that
//! consume their operating hours, and the reports printed from both.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod report;
pub mod repository;
pub mod services;
pub mod usage;
pub mod validation;

pub use api::router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
