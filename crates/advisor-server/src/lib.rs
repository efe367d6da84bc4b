//! HTTP server for advisor-rs
//!
//! Exposes the analysis engine over a small REST surface:
//!
//! - `POST /api/analysis/{symbol}` runs a full analysis
//! - `POST /api/chat/{symbol}` answers a follow-up question
//! - `GET /api/stocks/{symbol}/{quote,history,indicators}` pass market
//!   data through untouched
//! - `GET /health` reports the active strategy
//!
//! [`run`] wires environment-derived state into an actix-web server and
//! blocks until shutdown.

pub mod config;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use state::AppState;

use actix_web::{App, HttpServer, middleware, web};
use tracing::info;

/// Build the application state from the environment and serve until
/// interrupted
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_env(&config));
    info!(
        host = %config.host,
        port = config.port,
        strategy = state.service.strategy_name(),
        "starting advisor server"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
