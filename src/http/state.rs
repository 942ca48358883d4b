//! Shared state of the HTTP server.

use crate::loader::DatasetCache;
use std::sync::Arc;

/// Presentation settings fixed at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub sample_rows: usize,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Arc<DatasetCache>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(cache: DatasetCache, settings: Settings) -> Self {
        Self {
            cache: Arc::new(cache),
            settings: Arc::new(settings),
        }
    }
}
