//! Router assembly, start-up and graceful shutdown.

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, chat, health, mcq, not_found, page};
use crate::state::ServerState;
use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use quickmcq::RagConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware.
///
/// Layers run outermost first: trace, request id, request logging, CORS,
/// compression, timeout, body limit.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let probes = Router::new()
        .route("/", get(page))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let questions = Router::new()
        .route("/chat", post(chat::chat))
        .route("/api/v1", get(api_info))
        .route("/api/v1/ask", post(chat::ask))
        .route("/api/v1/mcq", post(mcq::generate_mcqs));

    Router::new()
        .merge(probes)
        .merge(questions)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and block until SIGTERM or Ctrl+C.
///
/// Loads the pipeline configuration named by `config.rag_config`, installs
/// logging and (optionally) the Prometheus recorder, opens the index and serves.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let rag = RagConfig::load(config.rag_config.as_deref()).context("invalid pipeline config")?;
    quickmcq::init_tracing(&rag.logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise logging")?;

    let mut state = ServerState::from_rag_config(config.clone(), &rag)
        .context("failed to build the answering pipeline")?;
    if config.metrics_enabled {
        state = state.with_metrics(crate::metrics::install()?);
    }

    let app = build_router(Arc::new(state));
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        addr = %addr,
        timeout_secs = config.timeout_secs,
        max_body_size_kb = config.max_body_size_kb,
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        provider = %rag.generation.provider,
        k = rag.retrieval.k,
        "server_starting"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
