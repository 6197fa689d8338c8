//! HTTP server: JSON API for the browser front end.
//!
//! Price and image proxies, roast/meme lookups, portfolio analysis,
//! saved portfolios and the leaderboard. CORS is open so a separately
//! hosted front end can call it.

pub mod image_proxy;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use routes::{ApiError, AppState, ServerState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        // Upstream proxies
        .route("/api/stock-price", get(routes::stock_price))
        .route("/api/crypto-price", get(routes::crypto_price))
        .route("/api/commodity-price", get(routes::commodity_price))
        .route("/api/meme-image", get(routes::meme_image))
        // Verdicts
        .route("/api/roast", get(routes::get_roast))
        .route("/api/meme", get(routes::get_meme))
        .route("/api/meme-templates", get(routes::get_meme_templates))
        // Portfolio analysis
        .route("/api/sample", get(routes::get_sample))
        .route("/api/portfolio", post(routes::post_portfolio))
        .route("/api/portfolio/csv", post(routes::post_portfolio_csv))
        .route("/api/portfolio/manual", post(routes::post_portfolio_manual))
        .route("/api/wrapped", post(routes::post_wrapped))
        // Persistence
        .route(
            "/api/leaderboard",
            get(routes::get_leaderboard).post(routes::post_leaderboard),
        )
        .route(
            "/api/portfolios",
            get(routes::list_portfolios).post(routes::save_portfolio),
        )
        .route(
            "/api/portfolios/:id",
            put(routes::update_portfolio).delete(routes::delete_portfolio),
        )
        .layer(cors)
        .with_state(state)
}

/// Serve on `host:port` until `shutdown` resolves. `host` may be a name
/// such as `localhost`; it is resolved at bind time.
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;

    info!(%addr, "Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
