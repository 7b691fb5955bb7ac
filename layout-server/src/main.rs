//! # Menu Designer Server
//!
//! Local designer backend. Binds to localhost only.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use layout_server::{
    api_router, metrics, spawn_flusher, AppState, CliArgs, FileCatalogProvider, ServerConfig,
};
use layout_core::FileLayoutStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build a CORS layer that only allows localhost origins.
fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels
/// (default: `info,layout_server=debug,layout_core=debug,tower_http=debug`).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,layout_server=debug,layout_core=debug,tower_http=debug")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_args(CliArgs::parse())?;

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let store = FileLayoutStore::new(config.data_dir.join("layouts"))?;
    let catalog = FileCatalogProvider::new(&config.data_dir);
    tracing::info!("Layouts stored in {:?}", store.data_dir());
    tracing::info!("Catalog read from {:?}", catalog.dir());

    let state = AppState::new(Arc::new(store), Arc::new(catalog), config.engine);
    let flusher = spawn_flusher(state.sessions.clone(), config.flush_interval);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = api_router(state)
        .merge(metrics_router)
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(config.port))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    // Bind to localhost ONLY
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Menu designer server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    flusher.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, flushing pending layouts");
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
