use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::Utc;
use log::{error, info, warn};
use pretty_duration::pretty_duration;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::RefreshConfig;
use crate::datasources::PriceFetcher;
use crate::price_cache::PriceCache;

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSummary {
    pub btc_defaulted: bool,
    pub stocks_refreshed: usize,
    pub stocks_failed: usize,
    pub elapsed: Duration,
}

enum RefreshTaskState {
    Stopped,
    Running {
        shutdown: CancellationToken,
        handle: JoinHandle<()>,
    },
}

/// Keeps the price cache warm by refreshing BTC and the watch-list on a timer.
pub struct PriceRefresher {
    fetcher: Arc<PriceFetcher>,
    cache: Arc<PriceCache>,
    config: RefreshConfig,
    state: Mutex<RefreshTaskState>,
    /// Mirrors `state` for readers that must not wait on the lock.
    running: AtomicBool,
}

impl PriceRefresher {
    pub fn new(fetcher: Arc<PriceFetcher>, cache: Arc<PriceCache>, config: RefreshConfig) -> PriceRefresher {
        PriceRefresher {
            fetcher,
            cache,
            config,
            state: Mutex::new(RefreshTaskState::Stopped),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Warms the cache with one refresh, then launches the periodic loop.
    ///
    /// Does nothing when the loop is already running. Concurrent callers wait
    /// on the state lock, so at most one loop is ever spawned.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if let RefreshTaskState::Running { .. } = *state {
            info!("Price refresher already running");
            return;
        }
        refresh_once(&self.fetcher, &self.cache, &self.config.watchlist).await;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            self.fetcher.clone(),
            self.cache.clone(),
            self.config.clone(),
            shutdown.clone(),
        ));
        *state = RefreshTaskState::Running { shutdown, handle };
        self.running.store(true, Ordering::Release);
        info!(
            "Price refresher started, every {} for {}",
            pretty_duration(&self.config.interval, None),
            self.config.watchlist.join(",")
        );
    }

    /// Signals the loop to exit and waits up to the grace period for it.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let (shutdown, mut handle) =
            match std::mem::replace(&mut *state, RefreshTaskState::Stopped) {
                RefreshTaskState::Running { shutdown, handle } => (shutdown, handle),
                RefreshTaskState::Stopped => return,
            };
        self.running.store(false, Ordering::Release);
        shutdown.cancel();
        match tokio::time::timeout(self.config.stop_grace, &mut handle).await {
            Ok(Ok(())) => info!("Price refresher stopped"),
            Ok(Err(e)) => error!("Price refresher task failed: {}", e),
            Err(_) => {
                warn!(
                    "Price refresher did not stop within {}, aborting",
                    pretty_duration(&self.config.stop_grace, None)
                );
                handle.abort();
            }
        }
    }

    pub async fn refresh_once(&self) -> RefreshSummary {
        refresh_once(&self.fetcher, &self.cache, &self.config.watchlist).await
    }
}

async fn refresh_loop(
    fetcher: Arc<PriceFetcher>,
    cache: Arc<PriceCache>,
    config: RefreshConfig,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = shutdown.cancelled() => break,
        }
        refresh_once(&fetcher, &cache, &config.watchlist).await;
    }
}

/// Runs one cycle: BTC plus every watch-list ticker, then a single cache swap.
async fn refresh_once(fetcher: &PriceFetcher, cache: &PriceCache, watchlist: &[String]) -> RefreshSummary {
    let started = Instant::now();
    let (btc, stocks) = futures::join!(
        fetcher.fetch_btc_price(),
        fetcher.fetch_stock_prices(watchlist)
    );
    let summary = RefreshSummary {
        btc_defaulted: btc.is_defaulted,
        stocks_refreshed: stocks.len(),
        stocks_failed: watchlist.len().saturating_sub(stocks.len()),
        elapsed: started.elapsed(),
    };
    cache.apply_refresh(btc, stocks, Utc::now()).await;
    info!(
        "Prices refreshed in {}: {} stocks ok, {} failed{}",
        pretty_duration(&summary.elapsed, None),
        summary.stocks_refreshed,
        summary.stocks_failed,
        if summary.btc_defaulted { ", BTC defaulted" } else { "" }
    );
    summary
}
