use std::sync::Arc;

use prompthub_core::storage::BlobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: prompthub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Where attachment bytes are written.
    pub blobs: Arc<dyn BlobStore>,
}
