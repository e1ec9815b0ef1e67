//! arpx-pub library interface
//!
//! Exposes the publishing pipeline and HTTP surface for integration
//! testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, PublishError};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use crate::config::PublishConfig;
use crate::services::PublishOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable runtime configuration
    pub config: Arc<PublishConfig>,
    /// Pipeline orchestrator (one per process, shared by all requests)
    pub orchestrator: Arc<PublishOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last publish error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: PublishConfig) -> arpx_common::Result<Self> {
        let orchestrator = PublishOrchestrator::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }
}

/// Build application router
///
/// Published sessions are served statically under `/p`, matching the
/// default public base URL.
pub fn build_router(state: AppState) -> Router {
    let public_root = state.config.public_root.clone();
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::upload_routes())
        .merge(api::health_routes())
        .nest_service("/p", ServeDir::new(public_root))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
