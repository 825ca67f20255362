use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failure of a single provider call.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{provider}: unreachable: {message}")]
    Unreachable { provider: &'static str, message: String },

    #[error("{provider}: timed out")]
    Timeout { provider: &'static str },

    #[error("{provider}: malformed response: {message}")]
    Malformed { provider: &'static str, message: String },

    #[error("{provider}: no data for {symbol}")]
    UnknownSymbol { provider: &'static str, symbol: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    ProviderUnreachable,
    MalformedResponse,
    UnknownSymbol,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Unreachable { .. } | FetchError::Timeout { .. } => {
                FetchErrorKind::ProviderUnreachable
            }
            FetchError::Malformed { .. } => FetchErrorKind::MalformedResponse,
            FetchError::UnknownSymbol { .. } => FetchErrorKind::UnknownSymbol,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            FetchError::Unreachable { provider, .. }
            | FetchError::Timeout { provider }
            | FetchError::Malformed { provider, .. }
            | FetchError::UnknownSymbol { provider, .. } => *provider,
        }
    }

    pub fn malformed(provider: &'static str, message: impl fmt::Display) -> FetchError {
        FetchError::Malformed {
            provider,
            message: message.to_string(),
        }
    }

    /// Classifies a transport error from reqwest.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout { provider }
        } else if err.is_decode() {
            FetchError::malformed(provider, err)
        } else {
            FetchError::Unreachable {
                provider,
                message: err.to_string(),
            }
        }
    }
}
