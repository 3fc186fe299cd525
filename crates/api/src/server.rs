use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mathperf_model::{PredictError, PredictService, Prediction, PredictionRequest};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Process-wide request-handling state. Built once at startup, immutable
/// afterwards, shared across handlers via `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service: PredictService,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    fn static_assets_root(&self) -> Option<PathBuf> {
        self.static_dir.clone()
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let message = err.to_string();
        match err {
            PredictError::MissingField(_) | PredictError::UnknownCategory { .. } => {
                Self::bad_request(message)
            }
            PredictError::ModelUnavailable => Self::service_unavailable(message),
            PredictError::Unexpected(_) => Self::internal(message),
        }
    }
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    axum::serve(listener, app)
        .await
        .context("prediction server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

pub fn build_router(state: SharedState) -> Router {
    let mut router = Router::new()
        .route("/predict", post(handle_predict))
        .route("/health", get(handle_health));

    if let Some(static_root) = state.static_assets_root() {
        if Path::new(&static_root).exists() {
            info!("Serving report pages from {:?}", static_root);
            router = router.fallback(serve_static_assets);
        } else {
            warn!("Report page directory {:?} does not exist", static_root);
        }
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn serve_static_assets(State(state): State<SharedState>, req: Request<Body>) -> Response {
    if let Some(static_root) = state.static_assets_root() {
        if Path::new(&static_root).exists() {
            let index_path = static_root.join("index.html");
            let service = ServeDir::new(static_root)
                .append_index_html_on_directories(true)
                .not_found_service(ServeFile::new(index_path));

            match service.oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(err) => {
                    warn!("Static asset error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("failed to serve static asset: {err}"),
                    )
                        .into_response()
                }
            }
        } else {
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    } else {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

async fn handle_predict(
    State(state): State<SharedState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    // Malformed bodies keep their rejection status but take the same
    // {error} envelope as pipeline failures.
    let Json(request) =
        payload.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;

    let prediction = state.service.predict(&request)?;
    Ok(Json(prediction))
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.service.is_ready(),
    })
}
