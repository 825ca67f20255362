use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::datasources::PriceFetcher;
use crate::price_cache::PriceCache;
use crate::record::PriceRecord;

/// Read path for request handlers: cache first, provider fetch on a miss.
#[derive(Clone)]
pub struct PriceQuery {
    cache: Arc<PriceCache>,
    fetcher: Arc<PriceFetcher>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastUpdate {
    pub last_updated: Option<DateTime<Utc>>,
    pub btc_last_updated: Option<DateTime<Utc>>,
    pub cached_stocks: usize,
}

impl PriceQuery {
    pub fn new(cache: Arc<PriceCache>, fetcher: Arc<PriceFetcher>) -> PriceQuery {
        PriceQuery { cache, fetcher }
    }

    pub async fn btc_price(&self) -> PriceRecord {
        match self.cache.get_btc().await {
            Some(record) => record,
            None => self.fetcher.fetch_btc_price().await,
        }
    }

    /// Altcoins are not mirrored, so this always goes to the providers.
    pub async fn crypto_price(&self, symbol: &str) -> Option<PriceRecord> {
        self.fetcher.fetch_crypto_price(symbol).await
    }

    pub async fn stock_price(&self, symbol: &str) -> Option<PriceRecord> {
        match self.cache.get_stock(symbol).await {
            Some(record) => Some(record),
            None => self.fetcher.fetch_stock_price(symbol).await,
        }
    }

    /// Looks up each ticker in order, dropping the ones nobody has data for.
    pub async fn stock_prices(&self, symbols: &[String]) -> Vec<PriceRecord> {
        let cached = self.cache.get_all_stocks().await;
        join_all(symbols.iter().map(|symbol| {
            let hit = cached.get(&symbol.trim().to_ascii_uppercase()).cloned();
            async move {
                match hit {
                    Some(record) => Some(record),
                    None => self.fetcher.fetch_stock_price(symbol).await,
                }
            }
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    pub async fn popular_stocks(&self, symbols: &[String]) -> Vec<PriceRecord> {
        self.fetcher.fetch_stock_prices(symbols).await
    }

    pub async fn last_update(&self) -> LastUpdate {
        let snapshot = self.cache.snapshot().await;
        LastUpdate {
            last_updated: snapshot.last_updated,
            btc_last_updated: snapshot.btc.as_ref().map(|b| b.last_updated),
            cached_stocks: snapshot.stocks.len(),
        }
    }
}
