//! HTTP Server for the wizard API.
//!
//! Provides REST endpoints over a single shared session; the state machine
//! itself lives in [`crate::session::DocumentProcessor`].
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Health check                         |
//! | GET    | `/api/session`         | Current session snapshot             |
//! | GET    | `/api/offices`         | Selectable offices                   |
//! | GET    | `/api/notices`         | SSE stream for real-time notices     |
//! | POST   | `/api/agenda`          | Switch the active agenda             |
//! | POST   | `/api/office`          | Select the office                    |
//! | POST   | `/api/case-number`     | Save the case number                 |
//! | POST   | `/api/input/{slot}`    | Upload one input (multipart)         |
//! | DELETE | `/api/input/{slot}`    | Remove one input                     |
//! | GET    | `/api/preview`         | Validated preview of the dataset     |
//! | GET    | `/api/readiness`       | Enabling state of every generator    |
//! | POST   | `/api/generate/{key}`  | Run a generator, returns the archive |
//! | POST   | `/api/reset`           | Tear down the session                |

use axum::{
    extract::{Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::notify::NOTIFIER;
use super::types::{
    error_response, AgendaRequest, CaseNumberRequest, OfficeRequest, SessionResponse,
};
use crate::agenda::{Agenda, Slot};
use crate::error::{GenerateError, ServerError};
use crate::office::OFFICES;
use crate::session::DocumentProcessor;

/// Shared session state behind the router.
pub type SharedProcessor = Arc<Mutex<DocumentProcessor>>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Process(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Generate(GenerateError::UnknownGenerator(_)) => StatusCode::NOT_FOUND,
            ServerError::Generate(GenerateError::Busy) => StatusCode::CONFLICT,
            ServerError::Generate(GenerateError::NotReady(_))
            | ServerError::Generate(GenerateError::NoProcessedData) => StatusCode::CONFLICT,
            ServerError::Generate(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Start the HTTP server over an already-configured processor.
pub async fn start_server(
    port: u16,
    processor: DocumentProcessor,
) -> Result<(), Box<dyn std::error::Error>> {
    let state: SharedProcessor = Arc::new(Mutex::new(processor));

    // Permissive CORS for development.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/session", get(session))
        .route("/api/offices", get(offices))
        .route("/api/notices", get(sse_notices))
        .route("/api/agenda", post(set_agenda))
        .route("/api/office", post(set_office))
        .route("/api/case-number", post(set_case_number))
        .route("/api/input/{slot}", post(upload_input).delete(remove_input))
        .route("/api/preview", get(preview))
        .route("/api/readiness", get(readiness))
        .route("/api/generate/{key}", post(generate))
        .route("/api/reset", post(reset))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Agendagen server running on http://localhost:{}", port);
    println!("   GET  /api/session       - Session snapshot");
    println!("   POST /api/input/{{slot}}  - Upload input sheet");
    println!("   POST /api/generate/{{k}}  - Run a generator");
    println!("   GET  /api/notices       - SSE notice stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "agendagen",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn session(State(state): State<SharedProcessor>) -> Json<SessionResponse> {
    let processor = state.lock().await;
    Json(SessionResponse::from_processor(&processor))
}

async fn offices() -> Json<Value> {
    Json(json!({ "offices": OFFICES }))
}

/// SSE endpoint for real-time notice streaming
async fn sse_notices() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = NOTIFIER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(notice) => {
            let json = serde_json::to_string(&notice).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn set_agenda(
    State(state): State<SharedProcessor>,
    Json(request): Json<AgendaRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let agenda = Agenda::from_key(&request.agenda)
        .ok_or_else(|| ServerError::BadRequest(format!("Unknown agenda: {}", request.agenda)))?;

    let mut processor = state.lock().await;
    processor.set_agenda(agenda);
    Ok(Json(SessionResponse::from_processor(&processor)))
}

async fn set_office(
    State(state): State<SharedProcessor>,
    Json(request): Json<OfficeRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let mut processor = state.lock().await;
    processor
        .select_office(&request.office)
        .ok_or_else(|| ServerError::BadRequest(format!("Unknown office: {}", request.office)))?;
    Ok(Json(SessionResponse::from_processor(&processor)))
}

async fn set_case_number(
    State(state): State<SharedProcessor>,
    Json(request): Json<CaseNumberRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let value = request.case_number.trim();
    if value.is_empty() {
        return Err(ServerError::BadRequest("Case number is empty".to_string()));
    }

    let mut processor = state.lock().await;
    processor.save_case_number(value);
    Ok(Json(SessionResponse::from_processor(&processor)))
}

/// Upload one input sheet; when the last required slot fills, the
/// transformation runs before the response is produced.
async fn upload_input(
    State(state): State<SharedProcessor>,
    Path(slot): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SessionResponse>, ServerError> {
    let slot = Slot::from_key(&slot)
        .ok_or_else(|| ServerError::BadRequest(format!("Unknown input slot: {}", slot)))?;

    let mut file_data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name().unwrap_or("") == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    let mut processor = state.lock().await;
    processor.submit_input(slot, bytes)?;
    Ok(Json(SessionResponse::from_processor(&processor)))
}

async fn remove_input(
    State(state): State<SharedProcessor>,
    Path(slot): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let slot = Slot::from_key(&slot)
        .ok_or_else(|| ServerError::BadRequest(format!("Unknown input slot: {}", slot)))?;

    let mut processor = state.lock().await;
    processor.remove_input(slot);
    Ok(Json(SessionResponse::from_processor(&processor)))
}

async fn preview(State(state): State<SharedProcessor>) -> Json<Value> {
    let processor = state.lock().await;
    match processor.preview() {
        Some(preview) => Json(json!({ "processed": true, "preview": preview })),
        None => Json(json!({ "processed": false })),
    }
}

async fn readiness(State(state): State<SharedProcessor>) -> Json<Value> {
    let processor = state.lock().await;
    Json(json!({ "generators": processor.readiness() }))
}

/// Run one generator and stream the finished archive back as a download.
async fn generate(
    State(state): State<SharedProcessor>,
    Path(key): Path<String>,
) -> Result<Response, ServerError> {
    let mut processor = state.lock().await;
    let archive = processor.generate(&key).await.map_err(ServerError::from)?;

    let disposition = format!("attachment; filename=\"{}\"", archive.name);
    let disposition = header::HeaderValue::from_str(&disposition)
        .map_err(|e| ServerError::Internal(format!("Bad archive name: {}", e)))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/zip"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

async fn reset(State(state): State<SharedProcessor>) -> Json<SessionResponse> {
    let mut processor = state.lock().await;
    processor.reset();
    Json(SessionResponse::from_processor(&processor))
}
