use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::datasources::{FetchError, FetchErrorKind};

/// Provider failure counters, one per error kind.
#[derive(Debug, Default)]
pub struct FailureCounters {
    provider_unreachable: AtomicU64,
    malformed_response: AtomicU64,
    unknown_symbol: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCountsSnapshot {
    pub provider_unreachable: u64,
    pub malformed_response: u64,
    pub unknown_symbol: u64,
}

impl FailureCounters {
    pub fn new() -> FailureCounters {
        FailureCounters::default()
    }

    pub fn record(&self, err: &FetchError) {
        self.counter(err.kind()).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: FetchErrorKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> FailureCountsSnapshot {
        FailureCountsSnapshot {
            provider_unreachable: self.get(FetchErrorKind::ProviderUnreachable),
            malformed_response: self.get(FetchErrorKind::MalformedResponse),
            unknown_symbol: self.get(FetchErrorKind::UnknownSymbol),
        }
    }

    fn counter(&self, kind: FetchErrorKind) -> &AtomicU64 {
        match kind {
            FetchErrorKind::ProviderUnreachable => &self.provider_unreachable,
            FetchErrorKind::MalformedResponse => &self.malformed_response,
            FetchErrorKind::UnknownSymbol => &self.unknown_symbol,
        }
    }
}
