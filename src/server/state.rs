//! Application state shared across HTTP handlers

use crate::config::Settings;
use crate::core::dispatch::DispatchEngine;
use crate::storage::Database;
use std::sync::Arc;

/// Shared resources handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Process settings (read-only)
    pub settings: Arc<Settings>,
    /// Dispatch engine serving the chat endpoints
    pub engine: Arc<DispatchEngine>,
    /// Database handle for admin CRUD and model listing
    pub db: Arc<Database>,
}

impl AppState {
    /// Assemble the state from its parts
    pub fn new(settings: Settings, engine: DispatchEngine, db: Database) -> Self {
        Self {
            settings: Arc::new(settings),
            engine: Arc::new(engine),
            db: Arc::new(db),
        }
    }
}
