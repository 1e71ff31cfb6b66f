use std::collections::HashSet;

use http::header::{CONNECTION, HOST};
use http::{HeaderMap, HeaderName};

/// Headers that only describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy of `headers` without hop-by-hop headers, including any header named
/// as a token of `Connection`.
pub(super) fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let connection_tokens = collect_connection_tokens(headers);
    let mut out = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if is_hop_by_hop(name) || connection_tokens.contains(name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    out
}

/// Headers for the upstream request. `Host` is left out so the client sets it
/// from the upstream URI.
pub(super) fn outbound(headers: &HeaderMap) -> HeaderMap {
    let mut out = end_to_end(headers);
    out.remove(HOST);
    out
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn collect_connection_tokens(headers: &HeaderMap) -> HashSet<String> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(split_header_tokens)
        .collect()
}

fn split_header_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').filter_map(|token| {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(
                trimmed
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_ascii_lowercase(),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue};

    use super::{end_to_end, outbound};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn end_to_end_drops_connection_token_headers() {
        let input = headers(&[
            ("host", "example"),
            ("connection", "\"Foo\", keep-alive"),
            ("foo", "bar"),
            ("x-test", "ok"),
        ]);
        let out = end_to_end(&input);
        assert!(out.get("foo").is_none());
        assert!(out.get("connection").is_none());
        assert_eq!(out["x-test"], "ok");
        assert_eq!(out["host"], "example");
    }

    #[test]
    fn end_to_end_drops_framing_headers() {
        let input = headers(&[
            ("transfer-encoding", "chunked"),
            ("te", "trailers"),
            ("upgrade", "websocket"),
            ("proxy-connection", "keep-alive"),
            ("accept", "application/json"),
        ]);
        let out = end_to_end(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out["accept"], "application/json");
    }

    #[test]
    fn repeated_values_are_kept_in_order() {
        let input = headers(&[("x-tag", "a"), ("x-tag", "b")]);
        let out = end_to_end(&input);
        let values: Vec<_> = out.get_all("x-tag").iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn outbound_leaves_host_to_the_client() {
        let input = headers(&[("host", "proxy.local:8081"), ("accept", "*/*")]);
        let out = outbound(&input);
        assert!(out.get("host").is_none());
        assert_eq!(out["accept"], "*/*");
    }
}
