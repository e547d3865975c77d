//! HTTP server for the summarizer API.
//!
//! Provides REST endpoints for:
//! - Summarizing raw transcript text or a `YouTube` video
//! - Proofreading captions and drawing mind maps from summaries
//! - Fetching a video's transcript and details

pub mod cache;
pub mod error;
pub mod routes;
pub mod state;

pub use cache::SummaryCache;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::core::errors::BoxError;

/// Router with CORS and request tracing applied.
///
/// # Errors
/// Returns an error if a configured CORS origin is not a valid header value.
pub fn build_app(state: Arc<AppState>, config: &ServerConfig) -> Result<Router, BoxError> {
    let cors = cors_layer(&config.cors_origins)?;
    Ok(create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// CORS for the browser front end; an empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, BoxError> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| format!("invalid CORS origin '{origin}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Bind `host:port` from `config` and serve until `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the address is invalid, the listener cannot bind or
/// the server fails.
pub async fn serve<F>(
    state: Arc<AppState>,
    config: &ServerConfig,
    shutdown_signal: F,
) -> Result<(), BoxError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state, config)?;
    let ip: IpAddr = config.host.parse()?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(origins = config.cors_origins.len(), "Insightmap server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::core::config::AppConfig;

    fn config_with_origins(origins: &[&str]) -> ServerConfig {
        ServerConfig {
            cors_origins: origins.iter().map(|o| (*o).to_string()).collect(),
            ..ServerConfig::default()
        }
    }

    fn health_from(origin: &str) -> Request<Body> {
        Request::builder()
            .uri("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_configured_origin_is_allowed() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        let app = build_app(state, &config_with_origins(&["https://app.example"])).unwrap();

        let allowed = app
            .clone()
            .oneshot(health_from("https://app.example"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );

        let other = app.oneshot(health_from("https://evil.example")).await.unwrap();
        assert!(other.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_empty_origin_list_allows_any() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        let app = build_app(state, &ServerConfig::default()).unwrap();

        let response = app.oneshot(health_from("https://anywhere.example")).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        let err = build_app(state, &config_with_origins(&["https://bad\norigin"])).unwrap_err();
        assert!(err.to_string().contains("invalid CORS origin"));
    }
}
