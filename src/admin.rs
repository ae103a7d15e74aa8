//! Administrative pipeline endpoints.
//!
//! Every route here mutates or inspects the content pipeline and requires
//! a verified admin session: a missing or invalid bearer token is 401, a
//! valid non-admin token is 403. Worker failures surface as 500 with the
//! worker's diagnostic text attached, unlike the chat path which absorbs
//! them.

use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::models::QueryCount;
use crate::server::{AdminSession, AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/scrape", post(handle_scrape))
        .route("/admin/upload", post(handle_upload))
        .route("/admin/files", get(handle_files))
        .route("/admin/delete-files", post(handle_delete_files))
        .route("/admin/reindex", post(handle_reindex))
        .route("/admin/clear-database", post(handle_clear_database))
        .route("/admin/analytics", get(handle_analytics))
}

// ============ POST /admin/scrape ============

#[derive(Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: String,
    #[serde(default, rename = "keepOldData")]
    keep_old_data: bool,
}

async fn handle_scrape(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<Value>, AppError> {
    if req.url.trim().is_empty() {
        return Err(AppError::bad_request("url must not be empty"));
    }

    tracing::info!(admin = %admin.email, url = %req.url, "scrape requested");
    let pages = state
        .store
        .scrape(state.workers.as_ref(), &req.url, req.keep_old_data)
        .await
        .map_err(|e| AppError::internal(format!("{:#}", e)))?;

    Ok(Json(json!({
        "success": true,
        "pages": pages,
        "message": format!("Successfully scraped {} pages from {}", pages, req.url),
    })))
}

// ============ POST /admin/upload ============

/// Accept a multipart upload (field name `file`), store it, and run the
/// file-processing worker over it. The saved file survives a processing
/// failure; it just won't be indexed until it is fixed or replaced.
async fn handle_upload(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request("No file provided"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, data.to_vec()));
        break;
    }

    let (name, bytes) = upload.ok_or_else(|| AppError::bad_request("No file provided"))?;
    tracing::info!(admin = %admin.email, file = %name, "upload requested");
    let (asset, result) = state
        .store
        .ingest_upload(state.workers.as_ref(), &name, &bytes)
        .await
        .map_err(|e| AppError::internal(format!("{:#}", e)))?;

    Ok(Json(json!({
        "success": true,
        "filename": asset.name,
        "size": asset.size_bytes,
        "message": "File uploaded and processed successfully",
        "result": result,
    })))
}

// ============ GET /admin/files ============

async fn handle_files(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Value>, AppError> {
    let files = state
        .store
        .list_assets()
        .await
        .map_err(|e| AppError::internal(format!("Failed to list files: {:#}", e)))?;

    Ok(Json(json!({ "files": files })))
}

// ============ POST /admin/delete-files ============

async fn handle_delete_files(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let names: Vec<String> = body
        .get("files")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::bad_request("Invalid files array"))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| AppError::bad_request("Invalid files array"))
        })
        .collect::<Result<_, _>>()?;

    tracing::info!(admin = %admin.email, count = names.len(), "deletion requested");
    let outcome = state.store.delete_assets(&names).await;

    let mut reply = Map::new();
    reply.insert("success".to_string(), json!(true));
    reply.insert("deletedCount".to_string(), json!(outcome.deleted_count));
    if !outcome.errors.is_empty() {
        reply.insert("errors".to_string(), json!(outcome.errors));
    }
    reply.insert(
        "message".to_string(),
        json!(format!(
            "Deleted {} file(s) successfully",
            outcome.deleted_count
        )),
    );
    Ok(Json(Value::Object(reply)))
}

// ============ POST /admin/reindex ============

async fn handle_reindex(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Value>, AppError> {
    let index = state
        .store
        .reindex(state.workers.as_ref())
        .await
        .map_err(|e| AppError::internal(format!("{:#}", e)))?;

    Ok(Json(json!({
        "success": true,
        "message": "Data reindexed successfully",
        "chunks": index.chunk_count,
        "files": index.file_count,
    })))
}

// ============ POST /admin/clear-database ============

async fn handle_clear_database(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
) -> Result<Json<Value>, AppError> {
    tracing::info!(admin = %admin.email, "clear-database requested");
    let warnings = state.store.clear_all().await;

    let mut reply = Map::new();
    reply.insert("success".to_string(), json!(true));
    reply.insert(
        "message".to_string(),
        json!("Database and all data cleared successfully"),
    );
    if !warnings.is_empty() {
        reply.insert("warnings".to_string(), json!(warnings));
    }
    Ok(Json(Value::Object(reply)))
}

// ============ GET /admin/analytics ============

async fn handle_analytics(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Vec<QueryCount>>, AppError> {
    let top = state
        .store
        .top_queries(10)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch analytics: {:#}", e)))?;
    Ok(Json(top))
}
