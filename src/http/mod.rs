//! HTTP server: accepts connections and hands every request to
//! `handlers::handle`. Routing lives in `handlers.rs`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    pin::pin,
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;

use crate::{api, config::Config, db::Store, prelude::*};


mod handlers;
mod log;
pub(crate) mod response;


/// Where and how to serve the API.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// TCP port to listen on.
    #[config(default = 3080)]
    pub(crate) port: u16,

    /// IP address to bind to. Use "0.0.0.0" to listen on all interfaces.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,

    /// How long to wait for open connections to finish their requests when
    /// shutting down, in seconds. Connections still open after that are
    /// dropped.
    #[config(default = 10)]
    pub(crate) shutdown_timeout: u64,
}


// All our responses are fully buffered.
pub(crate) type Response<T = Full<Bytes>> = hyper::Response<T>;
type Request<T = Incoming> = hyper::Request<T>;


/// Shared by all requests.
struct Context {
    api_root: api::RootNode,
    store: Store,
    config: Config,
}


/// Starts the HTTP server and runs it until the process receives Ctrl+C.
pub(crate) async fn serve(config: Config, api_root: api::RootNode, store: Store) -> Result<()> {
    let addr = SocketAddr::new(config.http.address, config.http.port);
    let shutdown_timeout = Duration::from_secs(config.http.shutdown_timeout);
    let ctx = Arc::new(Context { api_root, store, config });

    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut ctrl_c = pin!(tokio::signal::ctrl_c());

    loop {
        let (stream, peer) = tokio::select! {
            conn = listener.accept() => match conn {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept TCP connection: {e}");
                    continue;
                }
            },
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    error!("Failed to listen for Ctrl+C signal: {e}");
                }
                break;
            }
        };

        trace!("Accepted connection from {peer}");
        let ctx = Arc::clone(&ctx);
        let service = service_fn(move |req| {
            handle_internal_errors(handlers::handle(req, Arc::clone(&ctx)))
        });

        let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
        let conn = graceful.watch(conn.into_owned());
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("Error serving connection from {peer}: {e}");
            }
        });
    }

    info!("Shutting down HTTP server...");
    tokio::select! {
        _ = graceful.shutdown() => info!("All connections closed"),
        _ = tokio::time::sleep(shutdown_timeout) => {
            warn!("Timed out waiting for connections to close after {shutdown_timeout:?}");
        }
    }

    Ok(())
}

/// Turns a panic while handling a request into a `500` response, so that the
/// connection stays usable.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // The handler does not share any state that a panic could leave broken:
    // every request gets its own DB handle.
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => Ok(response),
        Err(panic) => {
            // For most panics (which use `panic!` like `println!`), the payload
            // is either `&str` or `String`.
            let msg = panic.downcast_ref::<String>()
                .map(|s| s.as_str())
                .or(panic.downcast_ref::<&str>().copied());

            error!("HTTP handler panicked: {}", msg.unwrap_or("<non-string payload>"));

            Ok(response::internal_server_error())
        }
    }
}
