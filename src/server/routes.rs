//! API route handlers.
//!
//! All endpoints return JSON except the image proxy. State is shared via
//! `Arc<ServerState>`; errors become `{"error": "..."}` with a status code.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::image_proxy::ImageProxy;
use crate::classify::meme::{MemeCatalog, RenderedMeme};
use crate::classify::roast::{roast, Roast};
use crate::config::AppConfig;
use crate::error::{ImageError, ParseError, PriceError};
use crate::portfolio::normalize::{parse_csv, parse_csv_strict};
use crate::portfolio::wrapped::{build_deck, WrappedDeck};
use crate::portfolio::{aggregate, sample_portfolio};
use crate::prices::{EntryFailure, ManualEntry, PriceRouter};
use crate::storage::{rank_badge, LeaderboardStore, LeaderboardSubmission, PortfolioStore};
use crate::types::{
    AssetClass, HoldingInput, LeaderboardEntry, MemeTemplate, PortfolioResult, PriceQuote,
    SavedPortfolio,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    pub prices: PriceRouter,
    pub memes: MemeCatalog,
    pub images: ImageProxy,
    pub portfolios: RwLock<PortfolioStore>,
    pub leaderboard: RwLock<LeaderboardStore>,
}

impl ServerState {
    pub fn new(
        prices: PriceRouter,
        memes: MemeCatalog,
        images: ImageProxy,
        portfolios: PortfolioStore,
        leaderboard: LeaderboardStore,
    ) -> Self {
        Self {
            prices,
            memes,
            images,
            portfolios: RwLock::new(portfolios),
            leaderboard: RwLock::new(leaderboard),
        }
    }

    /// Wire up live price sources and file-backed stores from config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let storage = &cfg.storage;
        Ok(Self::new(
            PriceRouter::from_config(&cfg.prices)?,
            MemeCatalog::default(),
            ImageProxy::new(&cfg.memes)?,
            PortfolioStore::open(storage.portfolios_path.as_str(), storage.max_saved_portfolios)?,
            LeaderboardStore::open(
                storage.leaderboard_path.as_str(),
                storage.leaderboard_capacity,
                storage.leaderboard_threshold,
            )?,
        ))
    }
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<PriceError> for ApiError {
    fn from(e: PriceError) -> Self {
        let status = match &e {
            PriceError::MissingSymbol | PriceError::UnsupportedSymbol { .. } => {
                StatusCode::BAD_REQUEST
            }
            PriceError::NotFound(_) => StatusCode::NOT_FOUND,
            PriceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        Self::unprocessable(e.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        let status = match &e {
            ImageError::MissingUrl | ImageError::ForeignHost(_) => StatusCode::BAD_REQUEST,
            ImageError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = %e, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    #[serde(rename = "return")]
    pub percentage_return: Option<String>,
    pub ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CsvQuery {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HoldingsRequest {
    pub holdings: Vec<HoldingInput>,
}

#[derive(Debug, Deserialize)]
pub struct ManualRequest {
    pub entries: Vec<ManualEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SavePortfolioRequest {
    #[serde(default)]
    pub name: String,
    pub holdings: Vec<HoldingInput>,
}

/// A portfolio with its summary and the verdict on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub holdings: Vec<HoldingInput>,
    pub summary: PortfolioResult,
    pub roast: Roast,
    pub meme: RenderedMeme,
    /// One meme per holding, in holding order.
    pub holding_memes: Vec<HoldingMeme>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingMeme {
    pub ticker: String,
    #[serde(flatten)]
    pub meme: RenderedMeme,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResponse,
    pub errors: Vec<EntryFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// 1-based position on the board.
    pub rank: usize,
    pub badge: &'static str,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

impl RankedEntry {
    fn at(index: usize, entry: LeaderboardEntry) -> Self {
        Self {
            rank: index + 1,
            badge: rank_badge(index),
            entry,
        }
    }
}

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_return(raw: Option<&str>) -> ApiResult<f64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing return"))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ApiError::bad_request(format!("return is not a finite number: {raw}"))),
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

fn validate_holdings(holdings: &[HoldingInput]) -> ApiResult<()> {
    holdings.iter().try_for_each(HoldingInput::validate)?;
    Ok(())
}

/// Aggregate and attach a roast and a meme. Single-holding portfolios are
/// roasted by name.
fn analyse(state: &ServerState, holdings: Vec<HoldingInput>) -> AnalysisResponse {
    let summary = aggregate(&holdings);
    let ticker = match holdings.as_slice() {
        [only] => Some(only.ticker.clone()),
        _ => None,
    };
    let pct = summary.percentage_return;

    let mut rng = rand::thread_rng();
    let roast = roast(pct, ticker.as_deref(), &mut rng);
    let meme = state.memes.render(pct, ticker.as_deref(), &mut rng);
    let holding_memes = summary
        .holdings
        .iter()
        .map(|h| HoldingMeme {
            ticker: h.ticker.clone(),
            meme: state
                .memes
                .render(h.percentage_gain, Some(h.ticker.as_str()), &mut rng),
        })
        .collect();

    AnalysisResponse {
        holdings,
        summary,
        roast,
        meme,
        holding_memes,
    }
}

async fn price(state: &ServerState, class: AssetClass, query: &SymbolQuery) -> ApiResult<Json<PriceQuote>> {
    let symbol = non_empty(&query.symbol).ok_or(PriceError::MissingSymbol)?;
    let quote = state.prices.quote_as(class, symbol).await?;
    Ok(Json(quote))
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/stock-price?symbol=
pub async fn stock_price(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<PriceQuote>> {
    price(&state, AssetClass::Stock, &query).await
}

/// GET /api/crypto-price?symbol=
///
/// Unknown coins are a 404 here rather than a 400.
pub async fn crypto_price(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<PriceQuote>> {
    price(&state, AssetClass::Crypto, &query).await.map_err(|e| {
        if e.status() == StatusCode::BAD_REQUEST && non_empty(&query.symbol).is_some() {
            ApiError::not_found(e.message)
        } else {
            e
        }
    })
}

/// GET /api/commodity-price?symbol=
pub async fn commodity_price(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<PriceQuote>> {
    price(&state, AssetClass::Commodity, &query).await
}

/// GET /api/meme-image?url=
pub async fn meme_image(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<Response> {
    let image = state.images.fetch(query.url.as_deref()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, state.images.cache_control()),
        ],
        image.bytes,
    )
        .into_response())
}

/// GET /api/roast?return=&ticker=
pub async fn get_roast(Query(query): Query<ReturnQuery>) -> ApiResult<Json<Roast>> {
    let pct = parse_return(query.percentage_return.as_deref())?;
    let roast = roast(pct, non_empty(&query.ticker), &mut rand::thread_rng());
    Ok(Json(roast))
}

/// GET /api/meme?return=&ticker=
pub async fn get_meme(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> ApiResult<Json<RenderedMeme>> {
    let pct = parse_return(query.percentage_return.as_deref())?;
    let meme = state
        .memes
        .render(pct, non_empty(&query.ticker), &mut rand::thread_rng());
    Ok(Json(meme))
}

/// GET /api/meme-templates
pub async fn get_meme_templates(State(state): State<AppState>) -> Json<Vec<MemeTemplate>> {
    Json(state.memes.templates().to_vec())
}

/// GET /api/sample
pub async fn get_sample(State(state): State<AppState>) -> Json<AnalysisResponse> {
    Json(analyse(&state, sample_portfolio()))
}

/// POST /api/portfolio
pub async fn post_portfolio(Json(req): Json<HoldingsRequest>) -> ApiResult<Json<PortfolioResult>> {
    validate_holdings(&req.holdings)?;
    Ok(Json(aggregate(&req.holdings)))
}

/// POST /api/portfolio/csv
pub async fn post_portfolio_csv(
    State(state): State<AppState>,
    Query(query): Query<CsvQuery>,
    body: String,
) -> ApiResult<Json<AnalysisResponse>> {
    let holdings = if query.strict {
        parse_csv_strict(&body)?
    } else {
        parse_csv(&body)?
    };
    info!(holdings = holdings.len(), strict = query.strict, "CSV portfolio parsed");
    Ok(Json(analyse(&state, holdings)))
}

/// POST /api/portfolio/manual
pub async fn post_portfolio_manual(
    State(state): State<AppState>,
    Json(req): Json<ManualRequest>,
) -> Json<ManualResponse> {
    let resolution = state.prices.build_holdings(&req.entries).await;
    info!(
        priced = resolution.holdings.len(),
        failed = resolution.errors.len(),
        "Manual portfolio priced"
    );
    Json(ManualResponse {
        analysis: analyse(&state, resolution.holdings),
        errors: resolution.errors,
    })
}

/// POST /api/wrapped
pub async fn post_wrapped(Json(req): Json<HoldingsRequest>) -> ApiResult<Json<WrappedDeck>> {
    validate_holdings(&req.holdings)?;
    let deck = build_deck(&req.holdings, &mut rand::thread_rng());
    Ok(Json(deck))
}

/// GET /api/leaderboard?limit=
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<RankedEntry>> {
    let board = state.leaderboard.read().await;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Json(
        board
            .top(limit)
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, e)| RankedEntry::at(i, e))
            .collect(),
    )
}

/// POST /api/leaderboard
pub async fn post_leaderboard(
    State(state): State<AppState>,
    Json(submission): Json<LeaderboardSubmission>,
) -> ApiResult<(StatusCode, Json<RankedEntry>)> {
    let mut board = state.leaderboard.write().await;
    if !board.qualifies(submission.percentage_loss) {
        return Err(ApiError::unprocessable(format!(
            "only returns below {}% make the Hall of Shame",
            board.threshold()
        )));
    }
    match board.submit(submission)? {
        Some((entry, index)) => Ok((StatusCode::CREATED, Json(RankedEntry::at(index, entry)))),
        None => Err(ApiError::unprocessable("the board is full of worse losses")),
    }
}

/// GET /api/portfolios
pub async fn list_portfolios(State(state): State<AppState>) -> Json<Vec<SavedPortfolio>> {
    Json(state.portfolios.read().await.list().to_vec())
}

/// POST /api/portfolios
pub async fn save_portfolio(
    State(state): State<AppState>,
    Json(req): Json<SavePortfolioRequest>,
) -> ApiResult<(StatusCode, Json<SavedPortfolio>)> {
    validate_holdings(&req.holdings)?;
    let saved = state.portfolios.write().await.save(&req.name, req.holdings)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PUT /api/portfolios/:id
pub async fn update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HoldingsRequest>,
) -> ApiResult<Json<SavedPortfolio>> {
    validate_holdings(&req.holdings)?;
    state
        .portfolios
        .write()
        .await
        .update(&id, req.holdings)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no saved portfolio {id}")))
}

/// DELETE /api/portfolios/:id
pub async fn delete_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.portfolios.write().await.delete(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("no saved portfolio {id}")))
    }
}
