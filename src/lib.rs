pub mod api;
pub mod app;
pub mod config;
pub mod datasources;
pub mod price_cache;
pub mod query;
pub mod record;
pub mod refresher;
pub mod stats;

pub use app::AppContext;
pub use config::{Config, RefreshConfig};
pub use price_cache::{PriceCache, PriceSnapshot};
pub use query::PriceQuery;
pub use record::PriceRecord;
pub use refresher::{PriceRefresher, RefreshSummary};
