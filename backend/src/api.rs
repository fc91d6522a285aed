use std::any::Any;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::Utc;
use todo_shared::{
    CreateTaskRequest, HealthStatus, ReadyStatus, Task, TaskId, UpdateTaskRequest,
};
use tokio::sync::RwLock;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::error::{ApiError, StoreError};
use crate::store::TaskStore;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<RwLock<TaskStore>>,
}

impl AppState {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}

/// The full application: REST routes, health probes, and the client shell for
/// every other path.
pub fn router(state: AppState, static_dir: impl AsRef<FsPath>) -> Router {
    let static_dir = static_dir.as_ref();
    let shell = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let routes = Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/:id", put(update_todo).delete(delete_todo))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .fallback_service(shell)
        .with_state(state);

    with_middleware(routes)
}

/// Panic recovery, request tracing and permissive CORS.
pub fn with_middleware(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Unexpected(detail).into_response()
}

fn parse_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse::<TaskId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::UnknownId(raw.to_string()))
}

async fn list_todos(State(state): State<AppState>) -> Json<Vec<Task>> {
    let store = state.store.read().await;
    Json(store.list().to_vec())
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;
    let task = state.store.write().await.create(payload.text.as_deref())?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let mut store = state.store.write().await;
    // Unknown ids are reported ahead of any problem with the body.
    if store.get(id).is_none() {
        return Err(StoreError::NotFound(id).into());
    }
    let Json(patch) = payload?;
    let task = store.update(id, &patch)?;
    Ok(Json(task))
}

async fn delete_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.write().await.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let count = state.store.read().await.len();
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        count,
    })
}

async fn ready() -> Json<ReadyStatus> {
    Json(ReadyStatus {
        status: "ready".to_string(),
        timestamp: Utc::now(),
    })
}
