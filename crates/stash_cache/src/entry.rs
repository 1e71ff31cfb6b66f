use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tokio::time::Instant;

/// Status, headers and body of an upstream response, fully buffered.
#[derive(Clone, Debug)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub stored_at: Instant,
    pub response: CapturedResponse,
}

impl CachedEntry {
    pub fn new(response: CapturedResponse, stored_at: Instant) -> Self {
        Self {
            stored_at,
            response,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Fresh while strictly younger than `timeout`.
    pub fn is_fresh(&self, timeout: Duration, now: Instant) -> bool {
        self.age(now) < timeout
    }
}
