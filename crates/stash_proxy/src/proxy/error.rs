use std::time::Duration;

use http::StatusCode;
use stash_cache::{BoxError, CacheError};
use thiserror::Error;

/// Everything that can end a proxied request early.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request body exceeds {limit} bytes")]
    RequestTooLarge { limit: u64 },

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] BoxError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to build upstream request: {0}")]
    UpstreamRequest(#[from] http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not answer within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("failed to read upstream response body: {0}")]
    UpstreamBody(#[source] BoxError),
}

impl ProxyError {
    /// Status sent to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RequestBody(_) | ProxyError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamRequest(_)
            | ProxyError::Upstream(_)
            | ProxyError::UpstreamTimeout(_)
            | ProxyError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
