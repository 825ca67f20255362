use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::RwLock;

use crate::record::PriceRecord;

/// One consistent view of every cached price.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    pub btc: Option<PriceRecord>,
    pub stocks: HashMap<String, PriceRecord>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// In-memory mirror of the latest known prices.
///
/// Writers build a whole new snapshot and swap it in, so readers always see
/// either the previous refresh or the next one, never a mix of both.
#[derive(Debug, Default)]
pub struct PriceCache {
    current: RwLock<Arc<PriceSnapshot>>,
}

impl PriceCache {
    pub fn new() -> PriceCache {
        PriceCache::default()
    }

    pub async fn snapshot(&self) -> Arc<PriceSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn get_btc(&self) -> Option<PriceRecord> {
        self.snapshot().await.btc.clone()
    }

    pub async fn get_stock(&self, symbol: &str) -> Option<PriceRecord> {
        self.snapshot()
            .await
            .stocks
            .get(&symbol.trim().to_ascii_uppercase())
            .cloned()
    }

    pub async fn get_all_stocks(&self) -> HashMap<String, PriceRecord> {
        self.snapshot().await.stocks.clone()
    }

    pub async fn get_last_updated(&self) -> Option<DateTime<Utc>> {
        self.snapshot().await.last_updated
    }

    /// Installs the results of one refresh cycle.
    ///
    /// Stocks are upserted by symbol; symbols missing from `stocks` keep their
    /// previous record. A slot never goes back in time: an incoming record
    /// older than the cached one is ignored.
    pub async fn apply_refresh(&self, btc: PriceRecord, stocks: Vec<PriceRecord>, now: DateTime<Utc>) {
        let mut current = self.current.write().await;
        let mut next = PriceSnapshot::clone(&current);
        next.btc = Some(newer(next.btc.take(), btc));
        for record in stocks {
            let symbol = record.symbol.clone();
            let kept = newer(next.stocks.remove(&symbol), record);
            next.stocks.insert(symbol, kept);
        }
        next.last_updated = Some(next.last_updated.map_or(now, |t| t.max(now)));
        debug!(
            "Price cache refreshed: btc={}, {} stocks",
            next.btc.is_some(),
            next.stocks.len()
        );
        *current = Arc::new(next);
    }
}

fn newer(existing: Option<PriceRecord>, incoming: PriceRecord) -> PriceRecord {
    match existing {
        Some(existing) if existing.last_updated > incoming.last_updated => existing,
        _ => incoming,
    }
}
