//! HTTP front end.
//!
//! Routes:
//! - GET /             - city form
//! - GET /weather      - form plus reading and alerts for `?city=`
//! - GET /api/weather  - same data as JSON
//! - GET /health       - liveness check

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rainwatch_core::{Alerts, FetchError, WeatherProvider, WeatherReading, classify};
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::render::{self, DEFAULT_CITY, PageView};

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
    templates: Arc<Tera>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> anyhow::Result<Self> {
        let templates = render::templates().context("Failed to load page templates")?;

        Ok(Self {
            provider,
            templates: Arc::new(templates),
        })
    }

    fn page(&self, status: StatusCode, page: &PageView) -> Response {
        match render::render_page(&self.templates, page) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                tracing::error!(error = ?err, "failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
struct WeatherPayload {
    reading: WeatherReading,
    alerts: Alerts,
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/weather", get(weather_page))
        .route("/api/weather", get(weather_json))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    if !state.provider.has_api_key() {
        tracing::warn!("no API key found; the UI will report it on every lookup");
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    tracing::info!("rainwatch listening on http://{bind}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("rainwatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}

async fn index(State(state): State<AppState>) -> Response {
    state.page(StatusCode::OK, &PageView::form(DEFAULT_CITY))
}

async fn weather_page(State(state): State<AppState>, Query(query): Query<CityQuery>) -> Response {
    let city = query.city.unwrap_or_default();

    match lookup(state.provider.as_ref(), &city).await {
        Ok((reading, alerts)) => state.page(
            StatusCode::OK,
            &PageView::with_reading(&city, &reading, alerts),
        ),
        Err(err) => {
            let status = if err.is_fatal() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::OK
            };
            state.page(status, &PageView::with_error(&city, &err))
        }
    }
}

async fn weather_json(State(state): State<AppState>, Query(query): Query<CityQuery>) -> Response {
    let city = query.city.unwrap_or_default();

    match lookup(state.provider.as_ref(), &city).await {
        Ok((reading, alerts)) => Json(WeatherPayload { reading, alerts }).into_response(),
        Err(err) => {
            let status = match err {
                FetchError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
                FetchError::EmptyCity => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_GATEWAY,
            };
            let payload = ErrorPayload {
                error: render::error_message(&err),
                upstream_status: err.status(),
            };
            (status, Json(payload)).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// One fetch-classify cycle.
async fn lookup(
    provider: &dyn WeatherProvider,
    city: &str,
) -> Result<(WeatherReading, Alerts), FetchError> {
    let reading = provider.current(city).await.inspect_err(|err| {
        if err.is_fatal() {
            tracing::error!(%city, error = %render::error_message(err), "weather lookup failed");
        } else {
            tracing::info!(%city, error = %err, "weather lookup returned no data");
        }
    })?;

    let alerts = classify(&reading);
    tracing::info!(%city, rain = ?alerts.rain, flood = ?alerts.flood, "classified alerts");

    Ok((reading, alerts))
}
