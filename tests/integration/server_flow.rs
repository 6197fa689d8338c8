//! HTTP flow through the router with stub prices and temp-file stores.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use memefolio::classify::meme::MemeCatalog;
use memefolio::config::AppConfig;
use memefolio::server::image_proxy::ImageProxy;
use memefolio::server::{build_router, AppState, ServerState};
use memefolio::storage::{delete_file, LeaderboardStore, PortfolioStore};

use crate::stub_prices::stub_router;

fn temp_path(name: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("memefolio_it_srv_{name}_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

fn state(portfolios: &str, leaderboard: &str) -> AppState {
    let cfg = AppConfig::default();
    let (prices, _) = stub_router();
    Arc::new(ServerState::new(
        prices,
        MemeCatalog::default(),
        ImageProxy::new(&cfg.memes).unwrap(),
        PortfolioStore::open(portfolios, cfg.storage.max_saved_portfolios).unwrap(),
        LeaderboardStore::open(
            leaderboard,
            cfg.storage.leaderboard_capacity,
            cfg.storage.leaderboard_threshold,
        )
        .unwrap(),
    ))
}

async fn post_json(state: &AppState, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let resp = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_manual_portfolio_to_hall_of_shame() {
    let portfolios = temp_path("portfolios");
    let leaderboard = temp_path("leaderboard");
    let state = state(&portfolios, &leaderboard);

    let (status, body) = post_json(
        &state,
        "/api/portfolio/manual",
        serde_json::json!({"entries": [{"ticker": "GME", "shares": 10, "purchasePrice": 80}]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["percentageReturn"], -75.0);
    assert_eq!(body["roast"]["tier"], "catastrophic");
    assert!(body["roast"]["roast"]
        .as_str()
        .unwrap()
        .ends_with("At least you have the memes."));
    assert!(body["errors"].as_array().unwrap().is_empty());

    let (status, body) = post_json(
        &state,
        "/api/leaderboard",
        serde_json::json!({"percentageLoss": -75.0, "ticker": "gme", "memeText": "This is fine"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rank"], 1);
    assert_eq!(body["ticker"], "GME");

    // Persisted for the next process
    let reopened = LeaderboardStore::open(leaderboard.as_str(), 50, -10.0).unwrap();
    assert_eq!(reopened.entries().len(), 1);

    delete_file(&portfolios).unwrap();
    delete_file(&leaderboard).unwrap();
}

#[tokio::test]
async fn test_save_then_list_portfolios() {
    let portfolios = temp_path("portfolios");
    let leaderboard = temp_path("leaderboard");
    let state = state(&portfolios, &leaderboard);

    let (status, saved) = post_json(
        &state,
        "/api/portfolios",
        serde_json::json!({"name": "gold bug", "holdings": [
            {"ticker": "GOLD", "shares": 1, "purchasePrice": 1900, "currentPrice": 2300}
        ]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let resp = build_router(state.clone())
        .oneshot(Request::builder().uri("/api/portfolios").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let list: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(list[0]["id"], saved["id"]);

    delete_file(&portfolios).unwrap();
    let _ = delete_file(&leaderboard);
}
