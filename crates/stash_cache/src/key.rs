use std::fmt;
use std::mem;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Uri};
use http_body::Body;
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};

use crate::error::{BoxError, CacheError};

/// Opaque fingerprint of a request: method, URI, headers and body.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Reads the whole body to derive the key, then puts an identical body
    /// back on the request so it can still be forwarded.
    pub async fn from_request<B>(req: &mut Request<B>) -> Result<Self, CacheError>
    where
        B: Body + From<Bytes>,
        B::Error: Into<BoxError>,
    {
        let body = mem::replace(req.body_mut(), B::from(Bytes::new()));
        let bytes = body
            .collect()
            .await
            .map_err(|e| CacheError::Body(e.into()))?
            .to_bytes();

        let key = Self::fingerprint(req.method(), req.uri(), req.headers(), &bytes);
        *req.body_mut() = B::from(bytes);
        Ok(key)
    }

    /// Deterministic key over already-buffered request parts.
    ///
    /// Every segment is length-prefixed so `"ab" + "c"` and `"a" + "bc"`
    /// never collide. Header names are visited in sorted order; values keep
    /// their arrival order.
    pub fn fingerprint(method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();

        segment(&mut hasher, method.as_str().as_bytes());
        segment(&mut hasher, uri.to_string().as_bytes());

        let mut names: Vec<&str> = headers.keys().map(|name| name.as_str()).collect();
        names.sort_unstable();
        hasher.update((names.len() as u64).to_be_bytes());

        for name in names {
            segment(&mut hasher, name.as_bytes());
            let values: Vec<&[u8]> = headers.get_all(name).iter().map(|v| v.as_bytes()).collect();
            hasher.update((values.len() as u64).to_be_bytes());
            for value in values {
                segment(&mut hasher, value);
            }
        }

        segment(&mut hasher, body);

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn segment(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
