use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Normalized price of one asset at one point in time.
///
/// Records are never mutated after construction; a refresh produces a new
/// record and the cache swaps it in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub price_usd: Decimal,
    /// Price denominated in BTC.
    pub price_in_asset: Option<Decimal>,
    pub change_24h: Option<Decimal>,
    pub change_percent_24h: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
    /// Set only on the last-resort BTC record served when every provider failed.
    pub is_defaulted: bool,
}

impl PriceRecord {
    pub fn new(symbol: &str, price_usd: Decimal, last_updated: DateTime<Utc>) -> PriceRecord {
        PriceRecord {
            symbol: symbol.to_ascii_uppercase(),
            price_usd,
            price_in_asset: None,
            change_24h: None,
            change_percent_24h: None,
            volume_24h: None,
            market_cap: None,
            last_updated,
            is_defaulted: false,
        }
    }
}
