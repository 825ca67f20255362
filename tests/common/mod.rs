#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;

use price_mirror::datasources::{
    AggregatorSource, EquitySource, ExchangeTicker, ExchangeTickerSource, FetchError,
    HistoryBar, SimplePrice, TradingPair,
};
use price_mirror::{AppContext, Config};

/// Exchange keyed by base asset; missing bases fail as unreachable.
#[derive(Default)]
pub struct FakeExchange {
    prices: Mutex<HashMap<String, Decimal>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakeExchange {
    pub fn with_prices(prices: &[(&str, i64)]) -> Arc<FakeExchange> {
        let exchange = FakeExchange::default();
        for (base, price) in prices {
            exchange.set(base, *price);
        }
        Arc::new(exchange)
    }

    pub fn set(&self, base: &str, price: i64) {
        self.prices
            .lock()
            .unwrap()
            .insert(base.to_owned(), Decimal::from(price));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeTickerSource for FakeExchange {
    fn name(&self) -> &'static str {
        "FakeExchange"
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<ExchangeTicker, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let price = self.prices.lock().unwrap().get(&pair.base).copied();
        match price {
            Some(last) => Ok(ExchangeTicker {
                last,
                change: Some(Decimal::from(-5)),
                quote_volume: Some(Decimal::from(1_000_000)),
            }),
            None => Err(FetchError::Unreachable {
                provider: "FakeExchange",
                message: format!("no ticker for {}", pair),
            }),
        }
    }
}

/// Aggregator keyed by asset id; missing ids fail as unreachable.
#[derive(Default)]
pub struct FakeAggregator {
    prices: Mutex<HashMap<String, Decimal>>,
    calls: AtomicUsize,
}

impl FakeAggregator {
    pub fn with_prices(prices: &[(&str, i64)]) -> Arc<FakeAggregator> {
        let aggregator = FakeAggregator::default();
        for (id, price) in prices {
            aggregator
                .prices
                .lock()
                .unwrap()
                .insert(id.to_string(), Decimal::from(*price));
        }
        Arc::new(aggregator)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AggregatorSource for FakeAggregator {
    fn name(&self) -> &'static str {
        "FakeAggregator"
    }

    async fn fetch_simple_price(&self, asset_id: &str) -> Result<SimplePrice, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let price = self.prices.lock().unwrap().get(asset_id).copied();
        match price {
            Some(usd) => Ok(SimplePrice {
                usd,
                usd_24h_change: Some(Decimal::from(2)),
                usd_24h_vol: None,
            }),
            None => Err(FetchError::Unreachable {
                provider: "FakeAggregator",
                message: format!("no price for {}", asset_id),
            }),
        }
    }
}

/// Equities keyed by ticker with a close series, oldest first.
#[derive(Default)]
pub struct FakeEquities {
    closes: Mutex<HashMap<String, Vec<Decimal>>>,
    failing: Mutex<HashSet<String>>,
    /// Applied to history calls once this many have been served.
    hang_after: Mutex<Option<(usize, Duration)>>,
    history_calls: AtomicUsize,
}

impl FakeEquities {
    pub fn with_closes(series: &[(&str, &[i64])]) -> Arc<FakeEquities> {
        let equities = FakeEquities::default();
        for (symbol, closes) in series {
            equities.set(symbol, closes);
        }
        Arc::new(equities)
    }

    pub fn watchlist() -> Arc<FakeEquities> {
        FakeEquities::with_closes(&[
            ("AAPL", &[188, 190]),
            ("TSLA", &[245, 250]),
            ("GOOGL", &[170, 172]),
            ("MSFT", &[405, 410]),
            ("AMZN", &[178, 180]),
        ])
    }

    pub fn set(&self, symbol: &str, closes: &[i64]) {
        self.closes.lock().unwrap().insert(
            symbol.to_owned(),
            closes.iter().map(|c| Decimal::from(*c)).collect(),
        );
    }

    pub fn fail(&self, symbol: &str) {
        self.failing.lock().unwrap().insert(symbol.to_owned());
    }

    pub fn hang_after(&self, served: usize, delay: Duration) {
        *self.hang_after.lock().unwrap() = Some((served, delay));
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EquitySource for FakeEquities {
    fn name(&self) -> &'static str {
        "FakeEquities"
    }

    async fn fetch_history(&self, symbol: &str, _range: &str) -> Result<Vec<HistoryBar>, FetchError> {
        let served = self.history_calls.fetch_add(1, Ordering::SeqCst);
        let hang = *self.hang_after.lock().unwrap();
        if let Some((after, delay)) = hang {
            if served >= after {
                tokio::time::sleep(delay).await;
            }
        }
        if self.failing.lock().unwrap().contains(symbol) {
            return Err(FetchError::Unreachable {
                provider: "FakeEquities",
                message: format!("{} unavailable", symbol),
            });
        }
        let closes = self.closes.lock().unwrap().get(symbol).cloned();
        let closes = closes.ok_or_else(|| FetchError::UnknownSymbol {
            provider: "FakeEquities",
            symbol: symbol.to_owned(),
        })?;
        let count = closes.len();
        Ok(closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| HistoryBar {
                close,
                // Distinct volume on the latest bar.
                volume: if i + 1 == count { 42_000_000 } else { 1_000 },
            })
            .collect())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch_timeout = Duration::from_secs(2);
    config
}

pub fn context(
    exchange: Arc<FakeExchange>,
    aggregator: Arc<FakeAggregator>,
    equities: Arc<FakeEquities>,
    config: &Config,
) -> AppContext {
    AppContext::with_sources(exchange, aggregator, equities, config)
}
