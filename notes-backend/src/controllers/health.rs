use actix_web::{HttpResponse, Responder, web};

use crate::AppState;
use crate::error::ApiResult;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let note_count = state.notes.count().await.map_err(|e| state.api_error(e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "backend": state.notes.backend_name(),
        "note_count": note_count,
        "uptime_secs": state.started_at.elapsed().as_secs()
    })))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
