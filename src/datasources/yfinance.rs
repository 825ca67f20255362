use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use yahoo_finance_api::{Quote, YahooConnector};

use super::datasource::{EquitySource, HistoryBar};
use super::error::FetchError;

const PROVIDER: &str = "Yahoo";

pub struct YahooFinanceDataSource {
    connector: Arc<YahooConnector>,
}

impl YahooFinanceDataSource {
    pub fn new(connector: Arc<YahooConnector>) -> YahooFinanceDataSource {
        YahooFinanceDataSource { connector }
    }

    async fn run_query(&self, symbol: &str, range: &str) -> Result<Vec<Quote>, FetchError> {
        let response = self
            .connector
            .get_quote_range(symbol, "1d", range)
            .await
            .map_err(|e| FetchError::Unreachable {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        // The chart endpoint answers unknown or untraded tickers with an empty result.
        let quotes = response.quotes().map_err(|_| FetchError::UnknownSymbol {
            provider: PROVIDER,
            symbol: symbol.to_owned(),
        })?;
        debug!("Yahoo: {} {:?}", symbol, &quotes);
        Ok(quotes)
    }
}

#[async_trait]
impl EquitySource for YahooFinanceDataSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_history(&self, symbol: &str, range: &str) -> Result<Vec<HistoryBar>, FetchError> {
        self.run_query(symbol, range)
            .await?
            .iter()
            .map(to_bar)
            .collect()
    }
}

fn to_bar(quote: &Quote) -> Result<HistoryBar, FetchError> {
    let close = Decimal::from_f64(quote.close)
        .ok_or_else(|| FetchError::malformed(PROVIDER, "failed to parse close into decimal"))?;
    Ok(HistoryBar {
        close,
        volume: quote.volume,
    })
}
