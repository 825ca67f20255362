use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::FetchError;

/// Exchange market such as `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> TradingPair {
        TradingPair {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeTicker {
    pub last: Decimal,
    pub change: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplePrice {
    pub usd: Decimal,
    pub usd_24h_change: Option<Decimal>,
    pub usd_24h_vol: Option<Decimal>,
}

/// One daily bar; `volume` is the session's share volume.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBar {
    pub close: Decimal,
    pub volume: u64,
}

#[async_trait]
pub trait ExchangeTickerSource: Sync + Send {
    fn name(&self) -> &'static str;
    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<ExchangeTicker, FetchError>;
}

#[async_trait]
pub trait AggregatorSource: Sync + Send {
    fn name(&self) -> &'static str;
    async fn fetch_simple_price(&self, asset_id: &str) -> Result<SimplePrice, FetchError>;
}

#[async_trait]
pub trait EquitySource: Sync + Send {
    fn name(&self) -> &'static str;
    /// Bars ordered oldest first.
    async fn fetch_history(&self, symbol: &str, range: &str) -> Result<Vec<HistoryBar>, FetchError>;
}
