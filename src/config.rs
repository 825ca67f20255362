use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_WATCHLIST: [&str; 5] = ["AAPL", "TSLA", "GOOGL", "MSFT", "AMZN"];
pub const POPULAR_STOCKS: [&str; 8] = ["AAPL", "TSLA", "GOOGL", "MSFT", "AMZN", "META", "NVDA", "NFLX"];

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: Duration,
    pub watchlist: Vec<String>,
    /// How long `stop` waits for the loop before abandoning it.
    pub stop_grace: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval: Duration::from_secs(60),
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            stop_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub refresh: RefreshConfig,
    pub fetch_timeout: Duration,
    pub history_range: String,
    pub popular_stocks: Vec<String>,
    pub binance_url: String,
    pub coingecko_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            refresh: RefreshConfig::default(),
            fetch_timeout: Duration::from_secs(10),
            history_range: "5d".to_owned(),
            popular_stocks: POPULAR_STOCKS.iter().map(|s| s.to_string()).collect(),
            binance_url: "https://api.binance.com".to_owned(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let defaults = Config::default();
        let watchlist = match lookup("PRICE_WATCHLIST") {
            Some(list) => parse_symbols(&list),
            None => defaults.refresh.watchlist,
        };
        if watchlist.is_empty() {
            return Err(anyhow!("PRICE_WATCHLIST must name at least one ticker"));
        }
        let interval = Duration::from_secs(parse_or(
            &lookup,
            "PRICE_REFRESH_INTERVAL_SECS",
            defaults.refresh.interval.as_secs(),
        )?);
        if interval.is_zero() {
            return Err(anyhow!("PRICE_REFRESH_INTERVAL_SECS must be positive"));
        }
        Ok(Config {
            bind_addr: parse_or(&lookup, "PRICE_BIND_ADDR", defaults.bind_addr)?,
            refresh: RefreshConfig {
                interval,
                watchlist,
                stop_grace: Duration::from_secs(parse_or(
                    &lookup,
                    "PRICE_STOP_GRACE_SECS",
                    defaults.refresh.stop_grace.as_secs(),
                )?),
            },
            fetch_timeout: Duration::from_millis(parse_or(
                &lookup,
                "PRICE_FETCH_TIMEOUT_MS",
                defaults.fetch_timeout.as_millis() as u64,
            )?),
            history_range: lookup("PRICE_HISTORY_RANGE").unwrap_or(defaults.history_range),
            popular_stocks: match lookup("PRICE_POPULAR_STOCKS") {
                Some(list) => parse_symbols(&list),
                None => defaults.popular_stocks,
            },
            binance_url: lookup("PRICE_BINANCE_URL").unwrap_or(defaults.binance_url),
            coingecko_url: lookup("PRICE_COINGECKO_URL").unwrap_or(defaults.coingecko_url),
        })
    }
}

/// Splits a comma-separated ticker list, upper-casing and dropping blanks.
pub fn parse_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {}: {:?}", key, value)),
        None => Ok(default),
    }
}
