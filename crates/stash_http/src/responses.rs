use bytes::Bytes;
use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use http::{HeaderValue, Response, StatusCode};
use http_body_util::Full;

pub const SERVER_NAME: &str = concat!("stash/", env!("CARGO_PKG_VERSION"));

/// Body returned by the health endpoint.
pub const HEALTH_BODY: &str = "Ping received. Server is healthy";

/// Generic helper: a response with a fully buffered body.
pub fn response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let body = body.into();
    let len = body.len();

    let mut res = Response::new(Full::new(body));
    *res.status_mut() = status;

    let headers = res.headers_mut();
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    res
}

/// Plain text responses.
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    response(status, "text/plain; charset=utf-8", body)
}

pub fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    response(status, "application/json", body)
}

pub fn health() -> Response<Full<Bytes>> {
    text_response(StatusCode::OK, HEALTH_BODY)
}

pub fn not_found() -> Response<Full<Bytes>> {
    text_response(StatusCode::NOT_FOUND, "404 Not Found\n")
}

pub fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut res = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed\n");
    res.headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    res
}

pub fn payload_too_large() -> Response<Full<Bytes>> {
    text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large\n")
}

pub fn internal_error() -> Response<Full<Bytes>> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
}

pub fn bad_gateway() -> Response<Full<Bytes>> {
    text_response(StatusCode::BAD_GATEWAY, "502 Bad Gateway\n")
}

/// Status page for any error status the proxy produces.
pub fn error_page(status: StatusCode) -> Response<Full<Bytes>> {
    match status {
        StatusCode::NOT_FOUND => not_found(),
        StatusCode::PAYLOAD_TOO_LARGE => payload_too_large(),
        StatusCode::BAD_GATEWAY => bad_gateway(),
        _ => internal_error(),
    }
}
