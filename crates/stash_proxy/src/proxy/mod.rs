use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use stash_cache::{BoxError, Lookup, ResponseCache};
use stash_http::responses::error_page;
use tracing::{debug, error, instrument, warn};

mod admin;
mod error;
mod headers;
mod response;
mod settings;
mod upstream;

pub use error::ProxyError;
pub use settings::ProxySettings;

use upstream::Upstream;

/// =======================================================
/// PROXY STATE
/// =======================================================
///
/// Shared by every connection through an `Arc<Proxy>`. The only state that
/// outlives a request is the response cache.
#[derive(Debug)]
pub struct Proxy {
    settings: ProxySettings,
    cache: Arc<ResponseCache>,
    upstream: Upstream,
}

impl Proxy {
    pub fn new(settings: ProxySettings) -> Self {
        let cache = Arc::new(ResponseCache::with_policy(settings.cache_policy()));
        Self::with_cache(settings, cache)
    }

    pub fn with_cache(settings: ProxySettings, cache: Arc<ResponseCache>) -> Self {
        let upstream = Upstream::new(
            settings.upstream.clone(),
            settings.upstream_timeout,
            settings.max_upstream_response_body_bytes,
        );
        Self {
            settings,
            cache,
            upstream,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// Entry point for one inbound request.
    ///
    /// Never fails: every error becomes a status page.
    #[instrument(
        skip(self, req),
        fields(client = %client_addr, method = %req.method(), path = %req.uri().path())
    )]
    pub async fn handle<B>(&self, req: Request<B>, client_addr: SocketAddr) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        if let Some(res) = admin::route(&self.settings, &self.cache, &req, client_addr) {
            return res;
        }

        match self.serve(req).await {
            Ok(res) => res,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    error!(target: "stash::proxy", error = %err, status = %status, "Request failed");
                } else {
                    warn!(target: "stash::proxy", error = %err, status = %status, "Request rejected");
                }
                error_page(status)
            }
        }
    }

    /// Lookup, then either Replay or Forward, Capture, Store and Relay.
    async fn serve<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, ProxyError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let limit = self.settings.max_request_body_bytes;
        if declared_length(req.headers()).is_some_and(|len| len > limit) {
            return Err(ProxyError::RequestTooLarge { limit });
        }

        let (parts, body) = req.into_parts();
        let body = Limited::new(body, usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
            .await
            .map_err(|err| {
                if err.is::<LengthLimitError>() {
                    ProxyError::RequestTooLarge { limit }
                } else {
                    ProxyError::RequestBody(err)
                }
            })?
            .to_bytes();
        let mut inbound = Request::from_parts(parts, Full::new(body.clone()));

        let lookup = self.cache.fetch(&mut inbound).await?;
        debug!(target: "stash::proxy", outcome = lookup.as_str(), "Cache lookup");

        if let Lookup::Fresh(cached) = lookup {
            return Ok(response::into_response(cached));
        }

        let captured = self
            .upstream
            .forward(inbound.method(), inbound.uri(), inbound.headers(), body)
            .await?;

        if let Err(err) = self.cache.upsert(&mut inbound, captured.clone()).await {
            warn!(target: "stash::proxy", error = %err, "Failed to store response; relaying anyway");
        }

        Ok(response::into_response(captured))
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
