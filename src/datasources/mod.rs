mod binance;
mod coingecko;
mod datasource;
mod error;
mod fallback;
mod yfinance;

pub use binance::BinanceTickerDataSource;
pub use coingecko::CoinGeckoDataSource;
pub use datasource::{
    AggregatorSource, EquitySource, ExchangeTicker, ExchangeTickerSource,
    HistoryBar, SimplePrice, TradingPair,
};
pub use error::{FetchError, FetchErrorKind};
pub use fallback::{aggregator_asset_id, trading_pair, PriceFetcher, DEFAULT_BTC_PRICE_USD};
pub use yfinance::YahooFinanceDataSource;
