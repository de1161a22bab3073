//! Quick MCQ HTTP server.
//!
//! Loads a persisted vector index once at start-up and answers questions over
//! it with a hosted LLM.
//!
//! # API Endpoints
//!
//! - `GET /` - quiz page
//! - `POST /chat` - `{"query": "..."}` -> `{"answer": "..."}`
//! - `POST /api/v1/ask` - answer plus retrieved sources
//! - `POST /api/v1/mcq` - `{"topic": "...", "count": 5}` -> structured MCQs
//! - `GET /health` - liveness probe
//! - `GET /ready` - readiness probe (503 until an index is loaded)
//! - `GET /metrics` - Prometheus metrics
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
