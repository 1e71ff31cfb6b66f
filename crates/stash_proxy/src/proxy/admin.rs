use std::net::SocketAddr;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use stash_cache::ResponseCache;
use stash_http::responses::{health, internal_error, json_response, method_not_allowed, not_found};
use tracing::{debug, error};

use super::settings::ProxySettings;

/// Built-in endpoints answered by the proxy itself. Paths match exactly; the
/// query string is ignored.
pub(super) fn route<B>(
    settings: &ProxySettings,
    cache: &ResponseCache,
    req: &Request<B>,
    client_addr: SocketAddr,
) -> Option<Response<Full<Bytes>>> {
    let path = req.uri().path();

    if path == settings.health_path {
        debug!(target: "stash::admin", client = %client_addr, "Health check");
        return Some(health());
    }

    if path != settings.stats_path {
        return None;
    }

    if !client_addr.ip().to_canonical().is_loopback() {
        return Some(not_found());
    }

    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Some(method_not_allowed("GET, HEAD"));
    }

    let body = match serde_json::to_vec(&cache.stats()) {
        Ok(body) => body,
        Err(err) => {
            error!(target: "stash::admin", error = %err, "Failed to render cache stats");
            return Some(internal_error());
        }
    };

    let mut res = json_response(StatusCode::OK, body);
    if req.method() == Method::HEAD {
        *res.body_mut() = Full::new(Bytes::new());
    }
    Some(res)
}
