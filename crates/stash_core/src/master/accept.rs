use std::future::Future;
use std::io;
use std::time::Duration;
use std::{net::SocketAddr, sync::Arc};

use stash_proxy::Proxy;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::worker::serve_connection;

/// Pause after an accept failure caused by resource exhaustion.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of inbound connections for the accept loop.
pub(crate) trait Accept: Send + Sync + 'static {
    fn accept_conn(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    fn accept_conn(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        self.accept()
    }
}

pub(crate) async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(
        target: "stash::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "stash::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "stash::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

struct AcceptedConn {
    stream: TcpStream,
    addr: SocketAddr,
    permit: OwnedSemaphorePermit,
}

/// Out of descriptors or buffers: retrying at once would spin.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.raw_os_error() {
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM) => Some(ACCEPT_BACKOFF),
        _ => None,
    }
}

/// Waits for a connection permit, then for the next client.
///
/// `Ok(None)` means `accept()` failed for this one connection; the error is
/// logged and the permit released. Only a closed semaphore is fatal.
async fn accept_with_permit<L: Accept>(
    listener: &L,
    listen_addr: &str,
    semaphore: &Arc<Semaphore>,
) -> anyhow::Result<Option<AcceptedConn>> {
    let permit = match semaphore.clone().acquire_owned().await {
        Ok(p) => p,
        Err(e) => {
            error!(
                target: "stash::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to acquire connection permit"
            );
            return Err(e.into());
        }
    };

    let (stream, addr) = match listener.accept_conn().await {
        Ok(pair) => pair,
        Err(e) => {
            let backoff = accept_backoff(&e);
            warn!(
                target: "stash::master",
                listen = %listen_addr,
                error = ?e,
                backoff_ms = backoff.map(|d| d.as_millis() as u64),
                "Failed to accept connection"
            );
            drop(permit);
            if let Some(delay) = backoff {
                tokio::time::sleep(delay).await;
            }
            return Ok(None);
        }
    };

    debug!(
        target: "stash::master",
        listen = %listen_addr,
        client_addr = %addr,
        available_permits = semaphore.available_permits(),
        "Connection accepted"
    );

    Ok(Some(AcceptedConn {
        stream,
        addr,
        permit,
    }))
}

#[instrument(
    skip(listener, semaphore, proxy),
    fields(
        listen = %listen_addr,
        available_permits = semaphore.available_permits(),
    )
)]
pub(crate) async fn accept_loop<L: Accept>(
    listener: L,
    listen_addr: String,
    semaphore: Arc<Semaphore>,
    proxy: Arc<Proxy>,
) -> anyhow::Result<()> {
    info!(
        target: "stash::master",
        listen = %listen_addr,
        "accept_loop started for listening socket"
    );

    loop {
        let Some(AcceptedConn { stream, addr, permit }) =
            accept_with_permit(&listener, &listen_addr, &semaphore).await?
        else {
            continue;
        };

        let proxy = proxy.clone();
        let span = tracing::info_span!(
            "client_connection",
            client_addr = %addr,
            listen = %listen_addr,
        );

        tokio::spawn(
            async move {
                let _permit = permit;

                if let Err(e) = serve_connection(stream, addr, proxy).await {
                    debug!(
                        target: "stash::worker",
                        client_addr = %addr,
                        error = ?e,
                        "Connection closed with an error"
                    );
                } else {
                    debug!(
                        target: "stash::worker",
                        client_addr = %addr,
                        "Connection handled successfully"
                    );
                }
            }
            .instrument(span),
        );
    }
}
