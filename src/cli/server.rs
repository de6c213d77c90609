//! HTTP server mode for the operator controls
//!
//! A thin surface over the session: read progress, trigger one step, reset.
//! Steps and resets are serialized through one async mutex so there is only
//! ever a single writer per process. The session file is shared with the CLI
//! (`enqueue`, `reset`), so every handler reloads it before answering.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::pipeline::Pipeline;
use crate::config::UploaderConfig;
use crate::error::{Error, Result};
use crate::profile::{list_builtin, load_profile};
use crate::state::{Session, StateManager};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Warehouse, staging and dataset settings
    pub uploader: UploaderConfig,
    /// Session file shared with the CLI
    pub state_path: PathBuf,
}

/// App state shared across handlers
struct AppState {
    pipeline: Pipeline,
    sessions: StateManager,
    writer: Mutex<()>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let sessions = StateManager::from_file(&config.state_path)?;
    let pipeline = Pipeline::open(config.uploader)?;

    let app = router(pipeline, sessions);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Build the router over an opened pipeline and session store
pub(crate) fn router(pipeline: Pipeline, sessions: StateManager) -> Router {
    let state = AppState {
        pipeline,
        sessions,
        writer: Mutex::new(()),
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/profiles", get(list_profiles))
        .route("/state", get(get_state))
        .route("/step", post(step))
        .route("/reset", post(reset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Built-in profile names and targets
async fn list_profiles() -> Response {
    let mut profiles = Vec::new();
    for name in list_builtin() {
        match load_profile(name) {
            Ok(profile) => profiles.push(json!({
                "name": profile.name,
                "kind": profile.kind,
                "title": profile.display_title(),
                "target_table": profile.target_table,
            })),
            Err(e) => return error_response(&e),
        }
    }
    (StatusCode::OK, Json(ApiResponse::success(profiles))).into_response()
}

/// Current progress, `{index, running, log}` plus the selected profile
async fn get_state(State(state): State<Arc<AppState>>) -> Response {
    if let Err(e) = state.sessions.load().await {
        return error_response(&e);
    }

    let body = match state.sessions.session().await {
        Some(session) => session_body(&session),
        None => json!({
            "profile": Value::Null,
            "state": state.sessions.state().await.view()
        }),
    };
    (StatusCode::OK, Json(ApiResponse::success(body))).into_response()
}

/// Process the next queued file
async fn step(State(state): State<Arc<AppState>>) -> Response {
    let _writer = state.writer.lock().await;
    if let Err(e) = state.sessions.load().await {
        return error_response(&e);
    }

    let session = match state.sessions.require_session().await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };

    let controller = match state
        .pipeline
        .controller(session.profile, session.options)
    {
        Ok(controller) => controller,
        Err(e) => return error_response(&e),
    };

    let (next, step) = controller.step(session.state).await;
    if let Err(e) = state.sessions.update_state(next).await {
        return error_response(&e);
    }

    match state.sessions.require_session().await {
        Ok(session) => {
            let mut body = session_body(&session);
            body["step"] = json!(step);
            (StatusCode::OK, Json(ApiResponse::success(body))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Reset progress to an empty queue
async fn reset(State(state): State<Arc<AppState>>) -> Response {
    let _writer = state.writer.lock().await;
    if let Err(e) = state.sessions.load().await {
        return error_response(&e);
    }

    match state.sessions.reset().await {
        Ok(fresh) => {
            tracing::info!(run_id = %fresh.run_id, "Session reset");
            (
                StatusCode::OK,
                Json(ApiResponse::success(json!({ "state": fresh.view() }))),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

fn session_body(session: &Session) -> Value {
    json!({
        "profile": session.profile.name,
        "options": session.options,
        "state": session.state.view()
    })
}

fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::State { .. } => StatusCode::CONFLICT,
        Error::Config { .. }
        | Error::MissingConfigField { .. }
        | Error::InvalidConfigValue { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::<()>::error(error.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RunOptions;
    use crate::staging::StagingArea;
    use crate::state::FileRef;
    use crate::warehouse::DuckDbWarehouse;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn app(dir: &TempDir, sessions: StateManager) -> Router {
        let staging = StagingArea::parse(dir.path().join("bucket").to_str().unwrap(), None).unwrap();
        let warehouse = Arc::new(DuckDbWarehouse::open_in_memory().unwrap());
        let pipeline = Pipeline::from_parts(UploaderConfig::default(), warehouse, staging);
        router(pipeline, sessions)
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempdir().unwrap();
        let (status, body) = call(app(&dir, StateManager::in_memory()), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_profiles() {
        let dir = tempdir().unwrap();
        let (status, body) = call(app(&dir, StateManager::in_memory()), "GET", "/profiles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_state_without_session() {
        let dir = tempdir().unwrap();
        let (status, body) = call(app(&dir, StateManager::in_memory()), "GET", "/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["profile"], Value::Null);
        assert_eq!(body["data"]["state"]["index"], json!(0));
        assert_eq!(body["data"]["state"]["running"], json!(false));
        assert_eq!(body["data"]["state"]["log"], json!([]));
    }

    #[tokio::test]
    async fn test_step_without_session_conflicts() {
        let dir = tempdir().unwrap();
        let (status, body) = call(app(&dir, StateManager::in_memory()), "POST", "/step").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_step_then_reset() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("jan.csv");
        std::fs::write(&file, "TGL,KODE OUTLET,QTY\n2024-01-05,OUT1,3\n").unwrap();

        let sessions = StateManager::in_memory();
        let profile = load_profile("daily").unwrap();
        let options = RunOptions::new().with_cutoff(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
        sessions
            .start(Session::new(profile, options, vec![FileRef::new(&file)]))
            .await
            .unwrap();

        let app = app(&dir, sessions.clone());

        let (status, body) = call(app.clone(), "POST", "/step").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["step"], json!("done"));
        assert_eq!(body["data"]["profile"], json!("daily"));
        assert_eq!(body["data"]["state"]["index"], json!(1));
        assert_eq!(body["data"]["state"]["phase"], json!("completed"));
        // File entry and the summary
        assert_eq!(body["data"]["state"]["log"].as_array().unwrap().len(), 2);

        let (status, body) = call(app.clone(), "POST", "/reset").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"]["index"], json!(0));
        assert_eq!(body["data"]["state"]["log"], json!([]));

        // Profile survives the reset
        let (_, body) = call(app, "GET", "/state").await;
        assert_eq!(body["data"]["profile"], json!("daily"));
        assert_eq!(sessions.state().await.index, 0);
    }

    #[tokio::test]
    async fn test_step_picks_up_session_enqueued_after_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");
        let file = dir.path().join("jan.csv");
        std::fs::write(&file, "TGL,KODE OUTLET,QTY\n2024-01-05,OUT1,3\n").unwrap();

        // Server comes up before anything is enqueued
        let app = app(&dir, StateManager::from_file(&path).unwrap());
        let (_, body) = call(app.clone(), "GET", "/state").await;
        assert_eq!(body["data"]["profile"], Value::Null);

        // The CLI enqueues through its own manager on the same file
        let cli = StateManager::from_file(&path).unwrap();
        let options = RunOptions::new().with_cutoff(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
        cli.start(Session::new(
            load_profile("daily").unwrap(),
            options,
            vec![FileRef::new(&file)],
        ))
        .await
        .unwrap();

        let (_, body) = call(app.clone(), "GET", "/state").await;
        assert_eq!(body["data"]["profile"], json!("daily"));
        assert_eq!(body["data"]["state"]["index"], json!(0));

        let (status, body) = call(app.clone(), "POST", "/step").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["step"], json!("done"));
        assert_eq!(body["data"]["state"]["index"], json!(1));

        // The file now holds the server's progress, not a stale copy
        let on_disk = StateManager::from_file(&path).unwrap().state().await;
        assert_eq!(on_disk.index, 1);

        // A CLI reset is seen by the next request
        cli.load().await.unwrap();
        cli.reset().await.unwrap();
        let (_, body) = call(app, "GET", "/state").await;
        assert_eq!(body["data"]["profile"], json!("daily"));
        assert_eq!(body["data"]["state"]["index"], json!(0));
        assert_eq!(body["data"]["state"]["log"], json!([]));
    }
}
