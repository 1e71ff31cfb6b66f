use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use stash_proxy::Proxy;
use tokio::net::TcpStream;

/// Serves every HTTP/1.1 request on one client connection through the proxy.
///
/// Dropping this future (client gone) drops any in-flight upstream call.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    client_addr: SocketAddr,
    proxy: Arc<Proxy>,
) -> anyhow::Result<()> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let proxy = proxy.clone();
        async move { Ok::<_, Infallible>(proxy.handle(req, client_addr).await) }
    });

    http1::Builder::new()
        .keep_alive(true)
        .serve_connection(io, service)
        .await
        .context("HTTP/1 connection error")?;

    Ok(())
}
