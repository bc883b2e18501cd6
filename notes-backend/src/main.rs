//! Notes backend: CRUD and search over text notes, served as a JSON API.
//!
//! Notes are persisted to a flat JSON file, a local SQLite database, or a
//! remote PostgreSQL database, chosen at startup from the environment.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;

mod config;
mod controllers;
mod error;
mod storage;

use config::Config;
use error::{ApiError, NoteError};
use storage::NoteRepository;

pub struct AppState {
    pub notes: Arc<dyn NoteRepository>,
    /// Server start time for uptime calculation
    pub started_at: Instant,
    /// Return raw storage error text to callers instead of a generic message
    pub expose_storage_errors: bool,
}

impl AppState {
    pub fn api_error(&self, error: NoteError) -> ApiError {
        ApiError::new(error, self.expose_storage_errors)
    }
}

fn log_endpoints() {
    log::info!("API endpoints:");
    log::info!("  GET    /api/notes                - Get all notes");
    log::info!("  POST   /api/notes                - Create new note");
    log::info!("  GET    /api/notes/{{id}}           - Get specific note");
    log::info!("  PUT    /api/notes/{{id}}           - Update note");
    log::info!("  DELETE /api/notes/{{id}}           - Delete note");
    log::info!("  GET    /api/notes/search?q=query - Search notes");
    log::info!("  GET    /api/health               - Health check");
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Notes backend v{}", controllers::health::VERSION);
    log::info!("Using storage backend: {}", config.backend);

    let notes = match storage::open(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            log::error!("Failed to open note storage: {}", e);
            std::process::exit(1);
        }
    };

    log_endpoints();

    let shutdown_notes = Arc::clone(&notes);
    let started_at = Instant::now();
    let expose_storage_errors = config.expose_storage_errors;
    if expose_storage_errors {
        log::warn!("Storage error details will be returned to API callers");
    }

    log::info!("Listening on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                notes: Arc::clone(&notes),
                started_at,
                expose_storage_errors,
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    log::info!("Closing note storage...");
    shutdown_notes.close().await;
    log::info!("Shutdown complete");

    Ok(())
}
