//! HTTP gateway.
//!
//! Exposes the conversational endpoints (chat, speech synthesis, contact)
//! to anonymous clients and the administrative pipeline endpoints (see
//! [`crate::admin`]) to bearer-authenticated admins.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Description |
//! |--------|------|------|-------------|
//! | `POST` | `/auth/login` | none | Exchange credentials for a session token |
//! | `GET`  | `/auth/verify` | bearer | Check a token and return its claims |
//! | `POST` | `/chat` | none | Ask the assistant; never hard-fails |
//! | `POST` | `/tts` | none | Synthesize speech for a reply |
//! | `POST` | `/contact` | none | Record a contact-form message |
//! | `GET`  | `/health` | none | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses carry a JSON envelope:
//!
//! ```json
//! { "error": { "code": "unauthorized", "message": "Unauthorized" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `forbidden`
//! (403), `internal` (500). Auth failures never carry detail beyond the
//! kind. The chat endpoint is the exception to the envelope: worker
//! failures there are absorbed by the fallback responder and the endpoint
//! answers 200 regardless.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the chat widget can
//! be embedded cross-origin.

use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::auth::{AuthError, AuthGateway, Claims};
use crate::config::Config;
use crate::fallback::FallbackResponder;
use crate::models::{ChatReply, ChatTurn};
use crate::store::PipelineStore;
use crate::worker::{ProcessWorkerPool, WorkerOp, WorkerOutcome, WorkerPool};

/// Chat context is bounded before it reaches the worker.
const MAX_HISTORY_TURNS: usize = 5;

/// A reply suggests at most this many follow-up prompts.
const MAX_FOLLOW_UPS: usize = 3;

/// Upload size ceiling for the multipart admin endpoint.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGateway>,
    pub workers: Arc<dyn WorkerPool>,
    pub store: Arc<PipelineStore>,
    pub fallback: FallbackResponder,
}

/// Build the shared state from configuration. Fails fast when a worker
/// script is missing or the store cannot be opened.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let workers = ProcessWorkerPool::new(config)?;
    let store = PipelineStore::open(config).await?;
    Ok(AppState {
        auth: Arc::new(AuthGateway::new(&config.auth)),
        workers: Arc::new(workers),
        store: Arc::new(store),
        fallback: FallbackResponder,
    })
}

/// Assemble the full route table, including the admin routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/verify", get(handle_verify))
        .route("/chat", post(handle_chat))
        .route("/tts", post(handle_tts))
        .route("/contact", post(handle_contact))
        .route("/health", get(handle_health))
        .merge(admin::routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway on the configured bind address and serve until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Gateway listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error envelope.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
pub(crate) struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request".to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized".to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "forbidden".to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: message.into(),
        }
    }
}

/// Map an auth failure onto its HTTP surface: the kind decides 401 vs
/// 403, and no further detail leaks.
fn auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::Forbidden => AppError::forbidden("Admin access required"),
        _ => AppError::unauthorized("Unauthorized"),
    }
}

// ============ Bearer authentication ============

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

/// Verify the bearer token on a request, if any.
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = bearer_token(headers).ok_or_else(|| AppError::unauthorized("Unauthorized"))?;
    state.auth.verify(&token).map_err(auth_error)
}

/// A verified admin session, extracted from the bearer token.
///
/// Every pipeline-mutating handler takes this as an argument. Because it
/// is extracted from the request parts, it runs before any body extractor:
/// an unauthenticated request is answered 401/403 without its body being
/// read at all.
pub(crate) struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = authenticate(state, &parts.headers)?;
        AuthGateway::require_admin(&claims).map_err(auth_error)?;
        Ok(AdminSession(claims))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /auth/login ============

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Exchange the configured credential pair for a signed session token.
/// Any other pair gets a uniform 401 with no token issued.
async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (token, claims) = state
        .auth
        .issue(&req.email, &req.password)
        .map_err(|_| AppError::unauthorized("Invalid credentials"))?;

    tracing::info!(email = %claims.email, "login succeeded");
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": {
            "id": claims.sub,
            "email": claims.email,
            "isAdmin": claims.is_admin,
        },
    })))
}

// ============ GET /auth/verify ============

async fn handle_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let claims = authenticate(&state, &headers)?;
    Ok(Json(json!({
        "email": claims.email,
        "isAdmin": claims.is_admin,
    })))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Ask the assistant. The inference worker may fail, time out, or emit
/// garbage; in every such case the fallback responder substitutes a
/// well-formed reply and the endpoint still answers 200.
async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let mut history = req.history;
    if history.len() > MAX_HISTORY_TURNS {
        history.drain(..history.len() - MAX_HISTORY_TURNS);
    }

    let payload = json!({
        "message": req.message,
        "language": req.language,
        "history": history,
    });
    let reply = match state.workers.invoke(WorkerOp::Chat, payload).await {
        WorkerOutcome::Json(value) => {
            chat_reply_from_worker(value).unwrap_or_else(|| state.fallback.respond(&req.message))
        }
        outcome => {
            tracing::warn!(?outcome, "chat worker unavailable, substituting fallback");
            state.fallback.respond(&req.message)
        }
    };

    if let Err(e) = state.store.record_conversation(&req.message, &reply.text).await {
        tracing::warn!(error = %e, "failed to record conversation");
    }

    Ok(Json(reply))
}

/// Accept a worker reply only if it carries usable text; anything else
/// falls through to the fallback responder.
fn chat_reply_from_worker(value: Value) -> Option<ChatReply> {
    let text = value.get("text")?.as_str()?.trim().to_string();
    if text.is_empty() {
        return None;
    }

    let mut follow_ups: Vec<String> = value
        .get("followUps")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    follow_ups.truncate(MAX_FOLLOW_UPS);

    Some(ChatReply { text, follow_ups })
}

// ============ POST /tts ============

#[derive(Deserialize)]
struct TtsRequest {
    #[serde(default)]
    text: String,
    #[serde(default = "default_language")]
    language: String,
}

/// Synthesize speech. There is no meaningful synthetic substitute for
/// audio, so worker failure (or an empty audio buffer) is a plain 500.
async fn handle_tts(
    State(state): State<AppState>,
    Json(req): Json<TtsRequest>,
) -> Result<Response, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::bad_request("text must not be empty"));
    }

    let payload = json!({"text": req.text, "language": req.language});
    match state.workers.invoke(WorkerOp::Tts, payload).await {
        WorkerOutcome::Binary(bytes) if !bytes.is_empty() => {
            Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
        }
        WorkerOutcome::Binary(_) => {
            Err(AppError::internal("Speech synthesis produced no audio"))
        }
        WorkerOutcome::Failed(failure) => {
            tracing::error!(error = %failure, "tts worker failed");
            Err(AppError::internal("Failed to generate audio"))
        }
        _ => Err(AppError::internal("Failed to generate audio")),
    }
}

// ============ POST /contact ============

#[derive(Deserialize)]
struct ContactRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

async fn handle_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<Value>, AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.message.trim().is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    state
        .store
        .record_contact_message(&req.name, &req.email, &req.message)
        .await
        .map_err(|e| AppError::internal(format!("Failed to save message: {:#}", e)))?;

    Ok(Json(json!({"message": "Contact message saved successfully"})))
}
