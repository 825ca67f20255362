use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use yahoo_finance_api::YahooConnector;

use crate::config::Config;
use crate::datasources::{
    AggregatorSource, BinanceTickerDataSource, CoinGeckoDataSource, EquitySource,
    ExchangeTickerSource, PriceFetcher, YahooFinanceDataSource,
};
use crate::price_cache::PriceCache;
use crate::query::PriceQuery;
use crate::refresher::PriceRefresher;
use crate::stats::FailureCounters;

/// Everything that lives for the whole process, shared by handle.
pub struct AppContext {
    pub cache: Arc<PriceCache>,
    pub fetcher: Arc<PriceFetcher>,
    pub refresher: Arc<PriceRefresher>,
    pub query: PriceQuery,
    pub failures: Arc<FailureCounters>,
    pub popular_stocks: Vec<String>,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<AppContext> {
        let client = Arc::new(
            Client::builder()
                .user_agent(concat!("price-mirror ", env!("CARGO_PKG_VERSION")))
                .timeout(config.fetch_timeout)
                .build()
                .context("failed to build HTTP client")?,
        );
        let connector = Arc::new(YahooConnector::new().context("failed to build Yahoo connector")?);
        let fetcher = PriceFetcher::new(
            Arc::new(BinanceTickerDataSource::new(client.clone(), config.binance_url.clone())),
            Arc::new(CoinGeckoDataSource::new(client, config.coingecko_url.clone())),
            Arc::new(YahooFinanceDataSource::new(connector)),
            config.fetch_timeout,
            config.history_range.clone(),
        );
        Ok(AppContext::with_fetcher(Arc::new(fetcher), config))
    }

    /// Builds the context around caller-supplied providers.
    pub fn with_sources(
        exchange: Arc<dyn ExchangeTickerSource>,
        aggregator: Arc<dyn AggregatorSource>,
        equities: Arc<dyn EquitySource>,
        config: &Config,
    ) -> AppContext {
        let fetcher = PriceFetcher::new(
            exchange,
            aggregator,
            equities,
            config.fetch_timeout,
            config.history_range.clone(),
        );
        AppContext::with_fetcher(Arc::new(fetcher), config)
    }

    fn with_fetcher(fetcher: Arc<PriceFetcher>, config: &Config) -> AppContext {
        let cache = Arc::new(PriceCache::new());
        AppContext {
            refresher: Arc::new(PriceRefresher::new(
                fetcher.clone(),
                cache.clone(),
                config.refresh.clone(),
            )),
            query: PriceQuery::new(cache.clone(), fetcher.clone()),
            failures: fetcher.failures(),
            popular_stocks: config.popular_stocks.clone(),
            cache,
            fetcher,
        }
    }
}
