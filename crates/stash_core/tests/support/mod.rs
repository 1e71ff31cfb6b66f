#![allow(dead_code)]

use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioIo};
use stash_config::StashConfig;
use stash_core::master::Master;
use stash_proxy::{Proxy, ProxySettings};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const UPSTREAM_BODY: &str = "{\"id\":1}";

/// What the mock upstream saw for one request.
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

// Minimal HTTP upstream that counts and records requests
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self::start_with(Bytes::from_static(UPSTREAM_BODY.as_bytes()), None).await
    }

    /// Answers every request with `body`, after `delay` when given.
    pub async fn start_with(body: Bytes, delay: Option<Duration>) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream addr");
        let requests = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let requests = requests.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        return;
                    };
                    let requests = requests.clone();
                    let seen = seen.clone();
                    let body = body.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |req: Request<Incoming>| {
                            let requests = requests.clone();
                            let seen = seen.clone();
                            let reply = body.clone();
                            async move {
                                if let Some(delay) = delay {
                                    tokio::time::sleep(delay).await;
                                }
                                let (parts, body) = req.into_parts();
                                let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();
                                let n = requests.fetch_add(1, Ordering::SeqCst) + 1;
                                seen.lock().unwrap().push(SeenRequest {
                                    method: parts.method,
                                    path_and_query: parts
                                        .uri
                                        .path_and_query()
                                        .map(|pq| pq.to_string())
                                        .unwrap_or_default(),
                                    headers: parts.headers,
                                    body,
                                });

                                let res = Response::builder()
                                    .status(StatusCode::OK)
                                    .header("content-type", "application/json")
                                    .header("x-upstream-hit", n.to_string())
                                    .body(Full::new(reply))
                                    .unwrap();
                                Ok::<_, Infallible>(res)
                            }
                        });
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
            })
        };

        Self {
            addr,
            requests,
            seen,
            task,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind ephemeral port");
    listener.local_addr().expect("ephemeral addr")
}

pub struct TestProxy {
    pub addr: SocketAddr,
    pub proxy: Arc<Proxy>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestProxy {
    pub async fn start(upstream: SocketAddr, cache_timeout: Duration) -> Self {
        Self::start_with(upstream, cache_timeout, |_| {}).await
    }

    /// Like `start`, with a hook to adjust the settings first.
    pub async fn start_with(
        upstream: SocketAddr,
        cache_timeout: Duration,
        configure: impl FnOnce(&mut ProxySettings),
    ) -> Self {
        let mut settings = ProxySettings::new(
            upstream.to_string().parse().expect("upstream authority"),
            cache_timeout,
        );
        settings.upstream_timeout = Duration::from_secs(2);
        configure(&mut settings);
        let proxy = Arc::new(Proxy::new(settings));

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind proxy");
        let addr = listener.local_addr().expect("proxy addr");

        let master = Master::from_parts(StashConfig::default(), proxy.clone());
        let task = tokio::spawn(master.serve(listener));

        Self { addr, proxy, task }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub fn client() -> Client<HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

pub async fn send(req: Request<Full<Bytes>>) -> Reply {
    let res = client().request(req).await.expect("proxy answered");
    let (parts, body) = res.into_parts();
    let body = body.collect().await.expect("response body").to_bytes();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

pub async fn get(url: &str) -> Reply {
    let req = Request::get(url).body(Full::new(Bytes::new())).unwrap();
    send(req).await
}

pub async fn post(url: &str, body: &'static str) -> Reply {
    let req = Request::post(url)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap();
    send(req).await
}
