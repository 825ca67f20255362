use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use pretty_duration::pretty_duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::config::parse_symbols;
use crate::record::PriceRecord;
use crate::stats::FailureCountsSnapshot;

#[derive(Debug, Serialize)]
pub struct BtcPriceResponse {
    pub price_usd: Decimal,
    pub price_btc: Decimal,
    pub change_24h: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
    pub is_defaulted: bool,
}

impl From<PriceRecord> for BtcPriceResponse {
    fn from(record: PriceRecord) -> Self {
        BtcPriceResponse {
            price_usd: record.price_usd,
            price_btc: record.price_in_asset.unwrap_or(Decimal::ONE),
            change_24h: record.change_24h,
            volume_24h: record.volume_24h,
            market_cap: record.market_cap,
            last_updated: record.last_updated,
            is_defaulted: record.is_defaulted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CryptoPriceResponse {
    pub symbol: String,
    pub price_usd: Decimal,
    pub price_btc: Option<Decimal>,
    pub change_24h: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CryptoPriceResponse {
    fn zeroed(symbol: &str) -> Self {
        CryptoPriceResponse {
            symbol: symbol.trim().to_ascii_uppercase(),
            price_usd: Decimal::ZERO,
            price_btc: Some(Decimal::ZERO),
            change_24h: Some(Decimal::ZERO),
            volume_24h: Some(Decimal::ZERO),
            market_cap: Some(Decimal::ZERO),
            last_updated: None,
        }
    }
}

impl From<PriceRecord> for CryptoPriceResponse {
    fn from(record: PriceRecord) -> Self {
        CryptoPriceResponse {
            symbol: record.symbol,
            price_usd: record.price_usd,
            price_btc: record.price_in_asset,
            change_24h: record.change_24h,
            volume_24h: record.volume_24h,
            market_cap: record.market_cap,
            last_updated: Some(record.last_updated),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockPriceResponse {
    pub symbol: String,
    pub price: Decimal,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StockPriceResponse {
    fn zeroed(symbol: &str) -> Self {
        StockPriceResponse {
            symbol: symbol.trim().to_ascii_uppercase(),
            price: Decimal::ZERO,
            change: Some(Decimal::ZERO),
            change_percent: Some(Decimal::ZERO),
            volume: Some(Decimal::ZERO),
            market_cap: Some(Decimal::ZERO),
            last_updated: None,
        }
    }
}

impl From<PriceRecord> for StockPriceResponse {
    fn from(record: PriceRecord) -> Self {
        StockPriceResponse {
            symbol: record.symbol,
            price: record.price_usd,
            change: record.change_24h,
            change_percent: record.change_percent_24h,
            volume: record.volume_24h,
            market_cap: record.market_cap,
            last_updated: Some(record.last_updated),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockPricesResponse {
    pub stocks: Vec<StockPriceResponse>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StockPricesResponse {
    fn from_records(records: Vec<PriceRecord>) -> Self {
        StockPricesResponse {
            last_updated: records.iter().map(|r| r.last_updated).max(),
            stocks: records.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LastUpdateResponse {
    pub last_updated: Option<DateTime<Utc>>,
    pub btc_last_updated: Option<DateTime<Utc>>,
    pub cached_stocks: usize,
    pub staleness_secs: Option<u64>,
    /// `staleness_secs` rendered for humans, e.g. "1m 5s".
    pub staleness: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub refresher_running: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TickersParams {
    pub tickers: String,
}

pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/crypto/btc-price", get(btc_price))
        .route("/crypto/price/{symbol}", get(crypto_price))
        .route("/stocks/prices", get(stock_prices))
        .route("/stocks/price/{symbol}", get(stock_price))
        .route("/stocks/popular", get(popular_stocks))
        .route("/dashboard/last-update", get(last_update))
        .route("/stats/failures", get(failures))
        .with_state(context)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Price mirror API is running" }))
}

async fn health(State(context): State<Arc<AppContext>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        refresher_running: context.refresher.is_running(),
        last_updated: context.cache.get_last_updated().await,
    })
}

async fn btc_price(State(context): State<Arc<AppContext>>) -> Json<BtcPriceResponse> {
    Json(context.query.btc_price().await.into())
}

async fn crypto_price(
    State(context): State<Arc<AppContext>>,
    Path(symbol): Path<String>,
) -> Json<CryptoPriceResponse> {
    Json(match context.query.crypto_price(&symbol).await {
        Some(record) => record.into(),
        None => CryptoPriceResponse::zeroed(&symbol),
    })
}

async fn stock_price(
    State(context): State<Arc<AppContext>>,
    Path(symbol): Path<String>,
) -> Json<StockPriceResponse> {
    Json(match context.query.stock_price(&symbol).await {
        Some(record) => record.into(),
        None => StockPriceResponse::zeroed(&symbol),
    })
}

async fn stock_prices(
    State(context): State<Arc<AppContext>>,
    Query(params): Query<TickersParams>,
) -> Json<StockPricesResponse> {
    let symbols = parse_symbols(&params.tickers);
    Json(StockPricesResponse::from_records(
        context.query.stock_prices(&symbols).await,
    ))
}

async fn popular_stocks(State(context): State<Arc<AppContext>>) -> Json<StockPricesResponse> {
    Json(StockPricesResponse::from_records(
        context.query.popular_stocks(&context.popular_stocks).await,
    ))
}

async fn last_update(State(context): State<Arc<AppContext>>) -> Json<LastUpdateResponse> {
    let update = context.query.last_update().await;
    // Clock skew can put the refresh slightly in the future; treat it as fresh.
    let staleness = update
        .last_updated
        .map(|t| (Utc::now() - t).to_std().unwrap_or_default());
    Json(LastUpdateResponse {
        staleness_secs: staleness.map(|d| d.as_secs()),
        staleness: staleness.map(|d| pretty_duration(&Duration::from_secs(d.as_secs()), None)),
        last_updated: update.last_updated,
        btc_last_updated: update.btc_last_updated,
        cached_stocks: update.cached_stocks,
    })
}

async fn failures(State(context): State<Arc<AppContext>>) -> Json<FailureCountsSnapshot> {
    Json(context.failures.snapshot())
}
