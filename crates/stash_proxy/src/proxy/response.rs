use bytes::Bytes;
use http::Response;
use http_body_util::Full;
use stash_cache::CapturedResponse;

/// Relay a captured upstream response to the client as-is.
pub(super) fn into_response(captured: CapturedResponse) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(captured.body));
    *res.status_mut() = captured.status;
    *res.headers_mut() = captured.headers;
    res
}
