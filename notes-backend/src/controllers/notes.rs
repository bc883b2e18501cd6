//! Notes REST API: CRUD and substring search over the note collection.

use actix_web::{HttpResponse, web};
use notes_types::{
    CreateNoteRequest, DeleteResponse, MISSING_FIELDS_MESSAGE, NoteResponse, SearchQuery,
    UpdateNoteRequest,
};

use crate::AppState;
use crate::error::{ApiResult, NoteError};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notes")
            .service(
                web::resource("")
                    .route(web::get().to(list_notes))
                    .route(web::post().to(create_note)),
            )
            // Must precede "/{id}"
            .service(web::resource("/search").route(web::get().to(search_notes)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_note))
                    .route(web::put().to(update_note))
                    .route(web::delete().to(delete_note)),
            ),
    );
}

/// List all notes
async fn list_notes(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let notes = state.notes.list().await.map_err(|e| state.api_error(e))?;
    Ok(HttpResponse::Ok().json(notes))
}

/// Create a note from `{title, content}`
async fn create_note(state: web::Data<AppState>, body: web::Bytes) -> ApiResult<HttpResponse> {
    // A missing or malformed body is reported the same way as missing fields
    let request: CreateNoteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateNoteRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| {
            state.api_error(NoteError::Validation(MISSING_FIELDS_MESSAGE.to_string()))
        })?
    };
    let new_note = request
        .validate()
        .map_err(|msg| state.api_error(NoteError::Validation(msg)))?;

    let note = state.notes.create(new_note).await.map_err(|e| state.api_error(e))?;
    log::info!("[NOTES] Created note {}", note.id);

    Ok(HttpResponse::Created().json(NoteResponse::ok(note)))
}

/// Get a single note by id
async fn get_note(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let note = state
        .notes
        .get(path.into_inner())
        .await
        .map_err(|e| state.api_error(e))?;
    Ok(HttpResponse::Ok().json(note))
}

/// Replace the supplied fields of a note. An empty body changes nothing but `updated_at`.
async fn update_note(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();

    let patch: UpdateNoteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        UpdateNoteRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            state.api_error(NoteError::Validation(format!(
                "Request body must be a JSON object: {}",
                e
            )))
        })?
    };
    patch
        .validate()
        .map_err(|msg| state.api_error(NoteError::Validation(msg)))?;

    let note = state.notes.update(id, patch).await.map_err(|e| state.api_error(e))?;
    log::info!("[NOTES] Updated note {}", id);

    Ok(HttpResponse::Ok().json(NoteResponse::ok(note)))
}

/// Delete a note by id
async fn delete_note(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    state.notes.delete(id).await.map_err(|e| state.api_error(e))?;
    log::info!("[NOTES] Deleted note {}", id);

    Ok(HttpResponse::Ok().json(DeleteResponse::ok()))
}

/// Case-insensitive search over title and content; blank `q` yields `[]`
async fn search_notes(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let q = query.q.as_deref().unwrap_or("");
    let notes = state.notes.search(q).await.map_err(|e| state.api_error(e))?;
    Ok(HttpResponse::Ok().json(notes))
}
