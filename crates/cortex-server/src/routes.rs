//! Router and handlers
//!
//! Successful responses are wrapped as `{"status": "success", "data": ...}`.
//! Everything under `/api` except the sign-in endpoints requires a session
//! token.

use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use cortex_core::domain::{FileRecord, ListFilesParams, StatsSnapshot, User};
use cortex_core::CoreError;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{extract_bearer_token, NO_TOKEN, TOKEN_FAILED, USER_GONE};
use crate::error::ApiError;
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users/profile", get(profile))
        .route("/drive/sync", post(sync_drive))
        .route("/files", get(list_files))
        .route("/files/stats", get(file_stats))
        .route("/files/{id}", delete(delete_file).patch(rename_file))
        .route("/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/auth/google/url", get(google_auth_url))
        .route("/auth/google/callback", post(google_callback));

    Router::new()
        .route("/health", get(health))
        .nest("/api", public_routes.merge(protected_routes))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!(origin, "Ignoring invalid CORS origin");
            layer
        }
    }
}

// ============================================================================
// Envelopes and extractors
// ============================================================================

#[derive(Debug, Serialize)]
struct Success<T> {
    status: &'static str,
    data: T,
}

fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        data,
    })
}

/// JSON body extractor whose rejections use the API error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// The authenticated user, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserView {
    id: String,
    email: String,
    name: String,
    last_sync_at: Option<DateTime<Utc>>,
    drive_connected: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            last_sync_at: user.last_sync_at(),
            drive_connected: user.is_drive_connected(),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized(NO_TOKEN))?;
    let user_id = state
        .sessions
        .verify(token)
        .ok_or_else(|| ApiError::unauthorized(TOKEN_FAILED))?;

    let user = state
        .state_repository
        .get_user(&user_id)
        .await
        .map_err(CoreError::Storage)?
        .ok_or_else(|| ApiError::unauthorized(USER_GONE))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

// ============================================================================
// Public handlers
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

#[derive(Debug, Serialize)]
struct AuthUrlResponse {
    url: String,
}

async fn google_auth_url(
    State(state): State<AppState>,
) -> Result<Json<Success<AuthUrlResponse>>, ApiError> {
    let url = state.login.authorization_url()?;
    Ok(success(AuthUrlResponse { url }))
}

#[derive(Debug, Deserialize)]
struct CallbackRequest {
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    token: String,
    user: UserView,
}

async fn google_callback(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CallbackRequest>,
) -> Result<Json<Success<SessionResponse>>, ApiError> {
    let user = state
        .login
        .execute(body.code.as_deref().unwrap_or_default())
        .await?;
    let token = state.sessions.issue(user.id()).map_err(ApiError::internal)?;

    Ok(success(SessionResponse {
        token,
        user: UserView::from(&user),
    }))
}

// ============================================================================
// Protected handlers
// ============================================================================

#[derive(Debug, Serialize)]
struct ProfileResponse {
    user: UserView,
}

async fn profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<Success<ProfileResponse>> {
    success(ProfileResponse {
        user: UserView::from(&user),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    message: &'static str,
    files_processed: usize,
}

async fn sync_drive(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Success<SyncResponse>>, ApiError> {
    let files_processed = state.synchronize.execute(user.id()).await?;
    info!(user_id = %user.id(), files_processed, "Drive sync finished");

    Ok(success(SyncResponse {
        message: "Drive sync completed successfully",
        files_processed,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    total: u64,
    page: u32,
    total_pages: u64,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct FilesResponse {
    files: Vec<FileRecord>,
    meta: PageMeta,
}

async fn list_files(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<Success<FilesResponse>>, ApiError> {
    let page = state.list_files.execute(user.id(), &params).await?;

    Ok(success(FilesResponse {
        files: page.files,
        meta: PageMeta {
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
            limit: page.limit,
        },
    }))
}

async fn file_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Success<StatsSnapshot>>, ApiError> {
    let stats = state.compute_stats.execute(user.id()).await?;
    Ok(success(stats))
}

async fn delete_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manage_file.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RenameRequest {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct FileResponse {
    file: FileRecord,
}

async fn rename_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RenameRequest>,
) -> Result<Json<Success<FileResponse>>, ApiError> {
    let file = state
        .manage_file
        .rename(user.id(), &id, body.name.as_deref())
        .await?;
    Ok(success(FileResponse { file }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    context: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

async fn chat(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Json<Success<ChatResponse>>, ApiError> {
    let reply = state
        .answer_question
        .execute(
            user.id(),
            body.message.as_deref().unwrap_or_default(),
            body.context.as_deref(),
        )
        .await?;
    Ok(success(ChatResponse { reply }))
}
