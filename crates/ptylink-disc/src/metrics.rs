//! Metrics HTTP endpoint.

use std::{io, sync::Arc};

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Produces the text served at `/metrics`.
pub trait MetricsSource: Send + Sync + 'static {
    fn render(&self) -> String;
}

impl<F> MetricsSource for F
where
    F: Fn() -> String + Send + Sync + 'static,
{
    fn render(&self) -> String {
        self()
    }
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to bind metrics server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

async fn metrics(State(source): State<Arc<dyn MetricsSource>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        source.render(),
    )
}

/// Router serving `GET /metrics`.
#[must_use]
pub fn router(source: Arc<dyn MetricsSource>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(source)
}

/// Serve metrics on `addr` in a background task.
///
/// An empty address disables the endpoint and returns `None`.
///
/// # Errors
/// Returns `Bind` if the address cannot be bound.
pub async fn serve_http_metrics(
    addr: &str,
    source: Arc<dyn MetricsSource>,
) -> Result<Option<JoinHandle<()>>, MetricsError> {
    if addr.is_empty() {
        return Ok(None);
    }

    let bind_err = |source| MetricsError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
    let local = listener.local_addr().map_err(bind_err)?;
    tracing::info!(addr = %local, "serving metrics");

    let app = router(source);
    Ok(Some(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server stopped: {e}");
        }
    })))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn source() -> Arc<dyn MetricsSource> {
        Arc::new(|| "ptylink_sessions_active 1\n".to_string())
    }

    #[tokio::test]
    async fn test_empty_addr_disables() {
        let handle = tokio_test::assert_ok!(serve_http_metrics("", source()).await);
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_bind_failure_is_returned() {
        let err = serve_http_metrics("not-an-address", source())
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Bind { ref addr, .. } if addr == "not-an-address"));
    }

    #[tokio::test]
    async fn test_serves_in_background() {
        let handle = serve_http_metrics("127.0.0.1:0", source())
            .await
            .unwrap()
            .unwrap();
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let res = router(source())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(
            res.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ptylink_sessions_active 1\n");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let res = router(source())
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panicking_source_is_caught() {
        let panicky: Arc<dyn MetricsSource> = Arc::new(|| -> String { panic!("render failed") });
        let res = router(panicky)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
