use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};
use rust_decimal::Decimal;

use super::datasource::{AggregatorSource, EquitySource, ExchangeTickerSource, TradingPair};
use super::error::FetchError;
use crate::record::PriceRecord;
use crate::stats::FailureCounters;

/// Served for BTC when every provider in the chain fails.
pub const DEFAULT_BTC_PRICE_USD: u32 = 45_000;

const BTC: &str = "BTC";
const DEFAULT_QUOTE: &str = "USDT";
const KNOWN_PAIRS: [(&str, &str); 5] = [
    ("BTC", "USDT"),
    ("ETH", "USDT"),
    ("ADA", "USDT"),
    ("DOT", "USDT"),
    ("LINK", "USDT"),
];

/// Fetches normalized prices by walking each asset class's provider chain.
///
/// BTC always yields a record (falling back to a flagged default), while
/// altcoins and stocks yield `None` once their chain is exhausted.
pub struct PriceFetcher {
    exchange: Arc<dyn ExchangeTickerSource>,
    aggregator: Arc<dyn AggregatorSource>,
    equities: Arc<dyn EquitySource>,
    call_timeout: Duration,
    history_range: String,
    failures: Arc<FailureCounters>,
}

impl PriceFetcher {
    pub fn new(
        exchange: Arc<dyn ExchangeTickerSource>,
        aggregator: Arc<dyn AggregatorSource>,
        equities: Arc<dyn EquitySource>,
        call_timeout: Duration,
        history_range: String,
    ) -> PriceFetcher {
        PriceFetcher {
            exchange,
            aggregator,
            equities,
            call_timeout,
            history_range,
            failures: Arc::new(FailureCounters::new()),
        }
    }

    pub fn failures(&self) -> Arc<FailureCounters> {
        self.failures.clone()
    }

    pub async fn fetch_btc_price(&self) -> PriceRecord {
        match self.from_exchange(BTC).await {
            Ok(record) => return record,
            Err(e) => warn!("BTC price from {} failed: {}", self.exchange.name(), e),
        }
        if let Some(asset_id) = aggregator_asset_id(BTC) {
            match self.from_aggregator(BTC, asset_id).await {
                Ok(record) => return record,
                Err(e) => warn!("BTC price from {} failed: {}", self.aggregator.name(), e),
            }
        }
        warn!("All BTC providers failed, serving default {}", DEFAULT_BTC_PRICE_USD);
        default_btc_record()
    }

    pub async fn fetch_crypto_price(&self, symbol: &str) -> Option<PriceRecord> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol == BTC {
            let record = self.fetch_btc_price().await;
            return if record.is_defaulted { None } else { Some(record) };
        }
        let record = match self.from_exchange(&symbol).await {
            Ok(record) => record,
            Err(e) => {
                warn!("{} price from {} failed: {}", symbol, self.exchange.name(), e);
                let asset_id = aggregator_asset_id(&symbol)?;
                match self.from_aggregator(&symbol, asset_id).await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("{} price from {} failed: {}", symbol, self.aggregator.name(), e);
                        return None;
                    }
                }
            }
        };
        let btc = self.fetch_btc_price().await;
        // A placeholder BTC price must not leak into the ratio.
        let price_in_asset = if btc.is_defaulted || btc.price_usd.is_zero() {
            None
        } else {
            Some(record.price_usd / btc.price_usd)
        };
        Some(PriceRecord {
            price_in_asset,
            ..record
        })
    }

    pub async fn fetch_stock_price(&self, symbol: &str) -> Option<PriceRecord> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let provider = self.equities.name();
        let history = match self
            .bounded(provider, self.equities.fetch_history(&symbol, &self.history_range))
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!("{} stock price from {} failed: {}", symbol, provider, e);
                return None;
            }
        };
        let last = match history.last() {
            Some(bar) => bar,
            None => {
                info!("{}: no trading data available", symbol);
                return None;
            }
        };
        let prev = history.len().checked_sub(2).map(|i| history[i].close);
        let change = prev.map(|p| last.close - p).unwrap_or(Decimal::ZERO);
        let change_percent = match prev {
            Some(p) if !p.is_zero() => change / p * Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        };
        Some(PriceRecord {
            change_24h: Some(change),
            change_percent_24h: Some(change_percent),
            volume_24h: Some(Decimal::from(last.volume)),
            ..PriceRecord::new(&symbol, last.close, Utc::now())
        })
    }

    /// Fetches every symbol concurrently, dropping the ones that fail.
    pub async fn fetch_stock_prices(&self, symbols: &[String]) -> Vec<PriceRecord> {
        join_all(symbols.iter().map(|s| self.fetch_stock_price(s)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn from_exchange(&self, symbol: &str) -> Result<PriceRecord, FetchError> {
        let pair = trading_pair(symbol);
        let ticker = self
            .bounded(self.exchange.name(), self.exchange.fetch_ticker(&pair))
            .await?;
        Ok(PriceRecord {
            price_in_asset: (symbol == BTC).then_some(Decimal::ONE),
            change_24h: Some(ticker.change.unwrap_or(Decimal::ZERO)),
            volume_24h: Some(ticker.quote_volume.unwrap_or(Decimal::ZERO)),
            ..PriceRecord::new(symbol, ticker.last, Utc::now())
        })
    }

    async fn from_aggregator(&self, symbol: &str, asset_id: &str) -> Result<PriceRecord, FetchError> {
        let price = self
            .bounded(self.aggregator.name(), self.aggregator.fetch_simple_price(asset_id))
            .await?;
        Ok(PriceRecord {
            price_in_asset: (symbol == BTC).then_some(Decimal::ONE),
            change_24h: Some(price.usd_24h_change.unwrap_or(Decimal::ZERO)),
            volume_24h: Some(price.usd_24h_vol.unwrap_or(Decimal::ZERO)),
            ..PriceRecord::new(symbol, price.usd, Utc::now())
        })
    }

    /// Applies the per-call timeout and counts the failure.
    async fn bounded<T>(
        &self,
        provider: &'static str,
        call: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout { provider }),
        };
        if let Err(ref e) = result {
            self.failures.record(e);
        }
        result
    }
}

pub fn trading_pair(symbol: &str) -> TradingPair {
    let symbol = symbol.to_ascii_uppercase();
    let quote = KNOWN_PAIRS
        .iter()
        .find(|(base, _)| *base == symbol)
        .map(|(_, quote)| *quote)
        .unwrap_or(DEFAULT_QUOTE);
    TradingPair::new(&symbol, quote)
}

pub fn aggregator_asset_id(symbol: &str) -> Option<&'static str> {
    match symbol.to_ascii_uppercase().as_str() {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "ADA" => Some("cardano"),
        "DOT" => Some("polkadot"),
        "LINK" => Some("chainlink"),
        _ => None,
    }
}

fn default_btc_record() -> PriceRecord {
    PriceRecord {
        price_in_asset: Some(Decimal::ONE),
        change_24h: Some(Decimal::ZERO),
        volume_24h: Some(Decimal::ZERO),
        is_defaulted: true,
        ..PriceRecord::new(BTC, Decimal::from(DEFAULT_BTC_PRICE_USD), Utc::now())
    }
}
