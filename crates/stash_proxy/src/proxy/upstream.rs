use std::time::Duration;

use bytes::Bytes;
use http::uri::Authority;
use http::{HeaderMap, Method, Request, Uri};
use http_body_util::{BodyExt, Full, Limited};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use stash_cache::CapturedResponse;
use tracing::{debug, instrument};

use super::error::ProxyError;
use super::headers;

/// Plain HTTP client bound to the single upstream.
#[derive(Debug)]
pub(super) struct Upstream {
    client: Client<HttpConnector, Full<Bytes>>,
    authority: Authority,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Upstream {
    pub(super) fn new(authority: Authority, timeout: Duration, max_body_bytes: u64) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            authority,
            timeout,
            max_body_bytes: usize::try_from(max_body_bytes).unwrap_or(usize::MAX),
        }
    }

    /// `http://{upstream}` followed by the inbound path and query.
    pub(super) fn target_uri(&self, inbound: &Uri) -> Result<Uri, http::Error> {
        let path_and_query = inbound
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Uri::builder()
            .scheme("http")
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Sends one request upstream and buffers the whole answer.
    ///
    /// Connect, response head and body all share a single deadline.
    #[instrument(skip_all, fields(upstream = %self.authority, method = %method))]
    pub(super) async fn forward(
        &self,
        method: &Method,
        uri: &Uri,
        inbound_headers: &HeaderMap,
        body: Bytes,
    ) -> Result<CapturedResponse, ProxyError> {
        let target = self.target_uri(uri)?;
        debug!(target: "stash::upstream", uri = %target, "Forwarding request upstream");

        let mut builder = Request::builder().method(method.clone()).uri(target);
        if let Some(headers) = builder.headers_mut() {
            *headers = headers::outbound(inbound_headers);
        }
        let req = builder.body(Full::new(body))?;

        let exchange = async {
            let res = self.client.request(req).await?;
            let (parts, body) = res.into_parts();

            let body = Limited::new(body, self.max_body_bytes)
                .collect()
                .await
                .map_err(ProxyError::UpstreamBody)?
                .to_bytes();

            debug!(
                target: "stash::upstream",
                status = %parts.status,
                body_len = body.len(),
                "Upstream response captured"
            );

            Ok::<_, ProxyError>(CapturedResponse::new(
                parts.status,
                headers::end_to_end(&parts.headers),
                body,
            ))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ProxyError::UpstreamTimeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Uri;

    use super::Upstream;

    fn upstream() -> Upstream {
        Upstream::new("10.0.0.2:8080".parse().unwrap(), Duration::from_secs(1), 1024)
    }

    #[tokio::test]
    async fn target_uri_keeps_path_and_query() {
        let inbound: Uri = "/items/7?expand=true".parse().unwrap();
        let target = upstream().target_uri(&inbound).unwrap();
        assert_eq!(target.to_string(), "http://10.0.0.2:8080/items/7?expand=true");
    }

    #[tokio::test]
    async fn target_uri_defaults_to_root() {
        let inbound: Uri = "http://proxy.local:8081".parse().unwrap();
        let target = upstream().target_uri(&inbound).unwrap();
        assert_eq!(target.to_string(), "http://10.0.0.2:8080/");
    }
}
