//! HTTP server assembly

use crate::config::Settings;
use crate::core::dispatch::DispatchEngine;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::Database;
use crate::utils::error::Result;
use actix_web::{web, App};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// The gateway's HTTP server
pub struct HttpServer {
    settings: Settings,
    state: AppState,
}

impl HttpServer {
    /// Connect the storage layer, run migrations, and assemble the state
    pub async fn new(settings: Settings) -> Result<Self> {
        let db = Database::connect(&settings.database_url).await?;
        db.migrate().await?;

        let engine = DispatchEngine::new(Arc::new(db.clone()))?;
        let state = AppState::new(settings.clone(), engine, db);

        Ok(Self { settings, state })
    }

    /// Bind and serve until shutdown
    pub async fn start(self) -> Result<()> {
        let state = self.state.clone();
        let (host, port) = self.settings.bind_addr();

        info!("Listening on http://{}:{}", host, port);
        if !self.settings.auth_enabled() {
            info!("TOKEN is empty; authentication is disabled");
        }

        actix_web::HttpServer::new(move || {
            App::new()
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(state.clone()))
                .configure(routes::configure)
        })
        .bind((host, port))?
        .run()
        .await?;

        Ok(())
    }
}

/// Load settings from the environment and run the gateway
pub async fn run_server() -> Result<()> {
    let settings = Settings::load()?;
    let server = HttpServer::new(settings).await?;
    server.start().await
}
