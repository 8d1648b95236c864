//! HTTP surface.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | /status | Health check |
//! | GET | /temperature/{zip_code} | Current temperature for a zip code |

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use cep_weather_core::{
    GetTemperatureByPostalCode, PostalCode, RequestContext, TemperatureResult, TypedError,
    model::INVALID_POSTAL_CODE,
};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppState {
    usecase: Arc<GetTemperatureByPostalCode>,
    /// Cancelled on shutdown; each request context derives a child token from it.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(usecase: GetTemperatureByPostalCode, shutdown: CancellationToken) -> Self {
        Self { usecase: Arc::new(usecase), shutdown }
    }
}

/// `TypedError` rendered as `{"status_code", "message"}` with its own HTTP status.
#[derive(Debug)]
pub struct ApiError(TypedError);

impl From<TypedError> for ApiError {
    fn from(err: TypedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0.status(), Json(self.0)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/temperature", get(missing_zip_code))
        .route("/temperature/", get(missing_zip_code))
        .route("/temperature/{zip_code}", get(temperature_by_zip_code))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status() -> (StatusCode, Json<StatusResponse>) {
    (StatusCode::OK, Json(StatusResponse { status: "Healthy" }))
}

async fn missing_zip_code() -> ApiError {
    TypedError::bad_request("zip code path param is not present").into()
}

async fn temperature_by_zip_code(
    State(state): State<AppState>,
    zip_code: Result<Path<String>, PathRejection>,
) -> Result<Json<TemperatureResult>, ApiError> {
    // A segment that does not decode to UTF-8 cannot be a zip code either.
    let Path(zip_code) = zip_code.map_err(|rejection| {
        tracing::debug!(%rejection, "undecodable zip code path param");
        TypedError::unprocessable(INVALID_POSTAL_CODE)
    })?;
    let postal_code = PostalCode::parse(&zip_code)?;
    let ctx = RequestContext::new().with_cancellation(state.shutdown.child_token());

    let result = state.usecase.execute(&ctx, &postal_code).await?;
    Ok(Json(result))
}

/// Serve until Ctrl-C, then cancel in-flight upstream calls and drain.
pub async fn serve(port: u16, usecase: GetTemperatureByPostalCode) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let app = router(AppState::new(usecase, shutdown.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await
        .context("Server terminated unexpectedly")
}
