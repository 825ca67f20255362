use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::Value as JsonValue;

use super::datasource::{AggregatorSource, SimplePrice};
use super::error::FetchError;

const PROVIDER: &str = "CoinGecko";

pub struct CoinGeckoDataSource {
    client: Arc<Client>,
    base_url: String,
}

impl CoinGeckoDataSource {
    pub fn new(client: Arc<Client>, base_url: String) -> CoinGeckoDataSource {
        CoinGeckoDataSource {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl AggregatorSource for CoinGeckoDataSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_simple_price(&self, asset_id: &str) -> Result<SimplePrice, FetchError> {
        let response: JsonValue = self
            .client
            .get(&format!("{}/simple/price", self.base_url))
            .query(&[
                ("ids", asset_id),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(PROVIDER, e))?;
        debug!("CoinGecko: {} {}", asset_id, response);
        parse_simple_price(asset_id, &response)
    }
}

fn parse_simple_price(asset_id: &str, response: &JsonValue) -> Result<SimplePrice, FetchError> {
    if let Some(message) = response["status"]["error_message"].as_str() {
        return Err(FetchError::Unreachable {
            provider: PROVIDER,
            message: message.to_owned(),
        });
    }
    let entry = &response[asset_id];
    if entry.is_null() {
        return Err(FetchError::UnknownSymbol {
            provider: PROVIDER,
            symbol: asset_id.to_owned(),
        });
    }
    let usd = entry["usd"]
        .as_f64()
        .and_then(Decimal::from_f64)
        .ok_or_else(|| FetchError::malformed(PROVIDER, "failed to parse usd price"))?;
    Ok(SimplePrice {
        usd,
        usd_24h_change: entry["usd_24h_change"].as_f64().and_then(Decimal::from_f64),
        usd_24h_vol: entry["usd_24h_vol"].as_f64().and_then(Decimal::from_f64),
    })
}
