use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use super::datasource::{ExchangeTicker, ExchangeTickerSource, TradingPair};
use super::error::FetchError;

const PROVIDER: &str = "Binance";
const INVALID_SYMBOL_CODE: i64 = -1121;

pub struct BinanceTickerDataSource {
    client: Arc<Client>,
    base_url: String,
}

impl BinanceTickerDataSource {
    pub fn new(client: Arc<Client>, base_url: String) -> BinanceTickerDataSource {
        BinanceTickerDataSource {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn market_symbol(pair: &TradingPair) -> String {
        format!("{}{}", pair.base, pair.quote)
    }
}

#[async_trait]
impl ExchangeTickerSource for BinanceTickerDataSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<ExchangeTicker, FetchError> {
        let resp_payload = self
            .client
            .get(&format!(
                "{}/api/v3/ticker/24hr?symbol={}",
                self.base_url,
                Self::market_symbol(pair)
            ))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(PROVIDER, e))?;
        let status = resp_payload.status();
        info!("Binance response code: {}", status);
        let body = resp_payload
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(PROVIDER, e))?;
        debug!("Binance: {} {}", pair, body);
        parse_response(pair, status, &body)
    }
}

/// Error payloads carrying `msg` are classified by `parse_ticker`; any other
/// non-2xx body (gateway pages, rate-limit HTML) means the exchange is unreachable.
fn parse_response(pair: &TradingPair, status: StatusCode, body: &str) -> Result<ExchangeTicker, FetchError> {
    let parsed = serde_json::from_str::<JsonValue>(body);
    if !status.is_success() {
        return match parsed {
            Ok(response) if response["msg"] != JsonValue::Null => parse_ticker(pair, &response),
            _ => Err(FetchError::Unreachable {
                provider: PROVIDER,
                message: format!("HTTP {}", status),
            }),
        };
    }
    let response = parsed.map_err(|e| FetchError::malformed(PROVIDER, e))?;
    parse_ticker(pair, &response)
}

fn parse_ticker(pair: &TradingPair, response: &JsonValue) -> Result<ExchangeTicker, FetchError> {
    if response["msg"] != JsonValue::Null {
        if response["code"].as_i64() == Some(INVALID_SYMBOL_CODE) {
            return Err(FetchError::UnknownSymbol {
                provider: PROVIDER,
                symbol: pair.to_string(),
            });
        }
        return Err(FetchError::Unreachable {
            provider: PROVIDER,
            message: response["msg"].to_string(),
        });
    }
    let last = decimal_field(response, "lastPrice")?
        .ok_or_else(|| FetchError::malformed(PROVIDER, "missing lastPrice"))?;
    Ok(ExchangeTicker {
        last,
        change: decimal_field(response, "priceChange")?,
        quote_volume: decimal_field(response, "quoteVolume")?,
    })
}

fn decimal_field(response: &JsonValue, field: &str) -> Result<Option<Decimal>, FetchError> {
    match response[field].as_str() {
        Some(s) => Decimal::from_str(s)
            .map(Some)
            .map_err(|e| FetchError::malformed(PROVIDER, format!("{}: {}", field, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::FetchErrorKind;
    use serde_json::json;

    #[test]
    fn parses_full_ticker() {
        let pair = TradingPair::new("btc", "usdt");
        let ticker = parse_ticker(
            &pair,
            &json!({
                "symbol": "BTCUSDT",
                "priceChange": "-120.50000000",
                "lastPrice": "61234.01000000",
                "quoteVolume": "1523456789.12"
            }),
        )
        .unwrap();
        assert_eq!(ticker.last, Decimal::from_str("61234.01").unwrap());
        assert_eq!(ticker.change, Some(Decimal::from_str("-120.5").unwrap()));
        assert_eq!(
            ticker.quote_volume,
            Some(Decimal::from_str("1523456789.12").unwrap())
        );
        assert_eq!(BinanceTickerDataSource::market_symbol(&pair), "BTCUSDT");
    }

    #[test]
    fn invalid_symbol_is_unknown() {
        let err = parse_ticker(
            &TradingPair::new("NOPE", "USDT"),
            &json!({"code": -1121, "msg": "Invalid symbol."}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::UnknownSymbol);
    }

    #[test]
    fn missing_last_price_is_malformed() {
        let err = parse_ticker(&TradingPair::new("ETH", "USDT"), &json!({"priceChange": "1"}))
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);

        let err = parse_ticker(&TradingPair::new("ETH", "USDT"), &json!({"lastPrice": "abc"}))
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);
    }

    #[test]
    fn error_status_without_payload_is_unreachable() {
        let pair = TradingPair::new("BTC", "USDT");
        let err = parse_response(
            &pair,
            StatusCode::SERVICE_UNAVAILABLE,
            "<html><body>503 Service Temporarily Unavailable</body></html>",
        )
        .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::ProviderUnreachable);

        let err = parse_response(&pair, StatusCode::BAD_GATEWAY, "{}").unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::ProviderUnreachable);
    }

    #[test]
    fn error_status_with_payload_keeps_its_code() {
        let err = parse_response(
            &TradingPair::new("NOPE", "USDT"),
            StatusCode::BAD_REQUEST,
            r#"{"code": -1121, "msg": "Invalid symbol."}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::UnknownSymbol);
    }

    #[test]
    fn garbled_success_body_is_malformed() {
        let err = parse_response(&TradingPair::new("BTC", "USDT"), StatusCode::OK, "<html>")
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);

        let ticker = parse_response(
            &TradingPair::new("BTC", "USDT"),
            StatusCode::OK,
            r#"{"lastPrice": "61000.5"}"#,
        )
        .unwrap();
        assert_eq!(ticker.last, Decimal::from_str("61000.5").unwrap());
    }
}
