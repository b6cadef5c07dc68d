//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::converter::{Converter, InkscapeConverter};
use crate::core::ServiceConfig;
use crate::{Ai2SvgError, Result};

use super::{
    handlers::{convert_handler, health_handler},
    rate_limit::{ClientRateLimiter, limit_by_client_ip},
    types::ApiState,
};

/// Headroom on top of the upload limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create the API router backed by Inkscape.
///
/// This is public to allow users to embed the router in their own applications.
///
/// # Examples
///
/// ```no_run
/// use ai2svg::{ServiceConfig, api::create_router};
/// use axum::Router;
///
/// let router = create_router(ServiceConfig::default());
/// let app: Router = Router::new().nest("/ai2svg", router);
/// ```
pub fn create_router(config: ServiceConfig) -> Router {
    let converter = Arc::new(InkscapeConverter::from_config(&config.converter));
    create_router_with_converter(config, converter)
}

/// Create the API router with an explicit converter.
///
/// Tests and embedders use this to substitute the external program.
pub fn create_router_with_converter(config: ServiceConfig, converter: Arc<dyn Converter>) -> Router {
    let body_limit = config.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors_layer = cors_layer(&config.cors_origins);
    let rate_limiter = ClientRateLimiter::from_config(&config.rate_limit).map(Arc::new);

    let state = ApiState {
        config: Arc::new(config),
        converter,
    };

    let mut convert_route = post(convert_handler);
    if let Some(limiter) = rate_limiter {
        convert_route = convert_route.route_layer(middleware::from_fn_with_state(limiter, limit_by_client_ip));
    }

    Router::new()
        .route("/convert", convert_route)
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<_> = origins
        .iter()
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if !allowed.is_empty() {
        tracing::info!("CORS configured with {} explicit allowed origin(s)", allowed.len());
        return CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any);
    }

    if origins.is_empty() {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set AI2SVG_CORS_ORIGINS \
             to a comma-separated list of allowed origins"
        );
    } else {
        tracing::warn!("AI2SVG_CORS_ORIGINS set but no origin is valid, falling back to permissive CORS");
    }
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

/// Start the API server backed by Inkscape.
///
/// # Examples
///
/// ```no_run
/// use ai2svg::{ServiceConfig, api::serve};
///
/// #[tokio::main]
/// async fn main() -> ai2svg::Result<()> {
///     let config = ServiceConfig::load(None)?;
///     serve(config).await?;
///     Ok(())
/// }
/// ```
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let converter = Arc::new(InkscapeConverter::from_config(&config.converter));
    serve_with_converter(config, converter).await
}

/// Start the API server with an explicit converter.
///
/// Creates the upload directory, logs converter availability once (advisory only;
/// every request checks again) and serves until Ctrl+C.
pub async fn serve_with_converter(config: ServiceConfig, converter: Arc<dyn Converter>) -> Result<()> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|e| Ai2SvgError::validation(format!("Invalid host address '{}': {}", config.host, e)))?;
    let addr = SocketAddr::new(ip, config.port);

    tokio::fs::create_dir_all(config.uploads_dir()).await?;
    log_startup_availability(converter.as_ref()).await;

    tracing::info!(
        environment = %config.environment,
        temp_dir = %config.temp_dir.display(),
        "Upload size limit: {} MB, page limit: {}",
        config.max_upload_mb,
        config.converter.max_pages
    );

    let app = create_router_with_converter(config, converter);

    tracing::info!("Starting ai2svg server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Ai2SvgError::Io)?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Ai2SvgError::Io)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn log_startup_availability(converter: &dyn Converter) {
    let status = converter.status().await;
    if status.available {
        tracing::info!("{}", status.message);
    } else {
        tracing::warn!(
            "{} is not available, conversions will fail until it is installed: {}",
            converter.name(),
            status.message
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
