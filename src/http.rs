use crate::collectors::collect_snapshot;
use crate::collectors::provider::MetricsProvider;
use crate::metrics::Metrics;
use crate::snapshot::ServerSnapshot;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

pub struct HttpAppState<P> {
    pub metrics: Arc<Metrics>,
    pub provider: Arc<Mutex<P>>,
    pub service_unit: Arc<str>,
}

impl<P> Clone for HttpAppState<P> {
    fn clone(&self) -> Self {
        Self {
            metrics: Arc::clone(&self.metrics),
            provider: Arc::clone(&self.provider),
            service_unit: Arc::clone(&self.service_unit),
        }
    }
}

pub fn build_router<P>(
    metrics: Arc<Metrics>,
    provider: Arc<Mutex<P>>,
    service_unit: &str,
) -> Router
where
    P: MetricsProvider + Send + 'static,
{
    Router::new()
        .route("/", get(dashboard))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler::<P>))
        .route("/api/server-status", get(server_status_handler::<P>))
        .with_state(HttpAppState {
            metrics,
            provider,
            service_unit: Arc::from(service_unit),
        })
}

async fn dashboard() -> impl IntoResponse {
    Html(include_str!("../static/index.html"))
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler<P>(State(state): State<HttpAppState<P>>) -> Response
where
    P: MetricsProvider + Send + 'static,
{
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ошибка кодирования метрик: {err}"),
        )
            .into_response(),
    }
}

async fn server_status_handler<P>(State(state): State<HttpAppState<P>>) -> impl IntoResponse
where
    P: MetricsProvider + Send + 'static,
{
    // Concurrent requests queue on the lock; at most one collection runs at a time.
    let collected = {
        let mut provider = state.provider.lock().await;
        collect_snapshot(&mut *provider, &state.service_unit).await
    };

    match collected {
        Ok(snapshot) => {
            state.metrics.update_from_snapshot(&snapshot);
            (StatusCode::OK, Json(snapshot))
        }
        Err(err) => {
            error!(
                error = %err,
                "сбор показателей завершился ошибкой, отдаётся деградированный снимок"
            );
            state.metrics.inc_collect_error(err.collector());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ServerSnapshot::degraded()),
            )
        }
    }
}
