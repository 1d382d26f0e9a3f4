#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::Result;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub question: String,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the application router. The pipeline is shared read-only state;
/// each request runs its own isolated pipeline invocation.
#[inline]
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .with_state(pipeline)
}

/// Bind and serve the HTTP API until the process is stopped.
#[inline]
pub async fn serve(pipeline: Pipeline, port: u16) -> Result<()> {
    let app = router(Arc::new(pipeline));
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server is running on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Answer one question. The blocking pipeline runs on the blocking thread
/// pool so concurrent requests don't stall the async runtime; a client
/// disconnect simply abandons the task, which is safe because a run shares
/// no state with anything else.
async fn analyze(
    State(pipeline): State<Arc<Pipeline>>,
    Json(request): Json<AnalyzeRequest>,
) -> std::result::Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let AnalyzeRequest { question, query } = request;

    let outcome =
        tokio::task::spawn_blocking(move || pipeline.run(&question, &query)).await;

    match outcome {
        Ok(Ok(answer)) => Ok(Json(AnalyzeResponse {
            answer: answer.text,
        })),
        Ok(Err(e)) => {
            // Full detail stays in the logs; the caller gets an opaque error.
            error!("Pipeline failed: {}", e);
            Err(internal_error())
        }
        Err(e) => {
            error!("Pipeline task aborted: {}", e);
            Err(internal_error())
        }
    }
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal Server Error".to_string(),
        }),
    )
}
