// Standard engine server: transport loop and per-request adaptation

use super::{Pools, Request, Response};
use crate::Error;
use crate::engine::native::{NativeRequest, NativeResponse, ResponseWriter};
use crate::engine::tls::TlsConfig;
use crate::engine::{Handler, ServerConfig};
use crate::logging::{debug, error, info, warn};
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Dispatch;

/// HTTP server that adapts every transport request into pooled
/// [`Request`]/[`Response`] wrappers and hands them to one [`Handler`].
///
/// Each server owns its own [`Pools`]. The handler and logger can be swapped
/// at any time; requests already in flight keep the ones they started with.
pub struct Server {
    config: Mutex<ServerConfig>,
    handler: RwLock<Arc<dyn Handler>>,
    logger: RwLock<Option<Dispatch>>,
    pools: Pools,
    shutdown: watch::Sender<bool>,
}

impl Server {
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_config(ServerConfig::new(address))
    }

    pub fn with_tls(
        address: impl Into<String>,
        cert_file: impl Into<String>,
        key_file: impl Into<String>,
    ) -> Self {
        Self::with_config(ServerConfig::new(address).with_tls(cert_file, key_file))
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let noop: Arc<dyn Handler> = Arc::new(|_: &Request, _: &Response| {});
        Self {
            config: Mutex::new(config),
            handler: RwLock::new(noop),
            logger: RwLock::new(None),
            pools: Pools::new(),
            shutdown: watch::channel(false).0,
        }
    }

    pub fn set_handler(&self, handler: impl Handler + 'static) {
        *self.handler.write() = Arc::new(handler);
    }

    /// Subscriber every request is dispatched under.
    pub fn set_logger(&self, logger: Dispatch) {
        *self.logger.write() = Some(logger);
    }

    pub fn logger(&self) -> Option<Dispatch> {
        self.logger.read().clone()
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn address(&self) -> String {
        self.config.lock().address.clone()
    }

    /// Serve one transport request.
    ///
    /// Acquires the five pooled wrappers, binds them to `w` and `r`, runs the
    /// handler and returns every wrapper to its pool, also when the handler
    /// panics.
    pub fn serve_http(&self, w: &NativeResponse, r: &NativeRequest) {
        let mut req_header = self.pools.header.acquire();
        req_header.reset(Arc::clone(r.headers()));
        let mut req_url = self.pools.url.acquire();
        req_url.reset(Arc::clone(r.url()));
        let mut req = self.pools.request.acquire();
        req.reset(r.clone(), req_header, req_url);

        let mut res = self.pools.response.acquire();
        let adapter = self.pools.response_adapter.acquire();
        let mut res_header = self.pools.header.acquire();
        res_header.reset(w.headers());
        res.reset(w.clone(), adapter, res_header);

        let lease = Lease {
            pools: &self.pools,
            request: Some(req),
            response: Some(res),
        };
        let handler = Arc::clone(&*self.handler.read());
        let logger = self.logger.read().clone();

        if let (Some(req), Some(res)) = (lease.request.as_deref(), lease.response.as_deref()) {
            match logger {
                Some(dispatch) => {
                    tracing::dispatcher::with_default(&dispatch, || handler.serve(req, res))
                }
                None => handler.serve(req, res),
            }
        }
    }

    /// Listen and serve until [`stop`](Self::stop) is called.
    ///
    /// Serves on the configured listener if one was supplied, otherwise binds
    /// the address, with TLS when a certificate and key are configured.
    pub async fn start(self: Arc<Self>) -> Result<(), Error> {
        let (supplied, address, tls_files, timeouts) = {
            let mut config = self.config.lock();
            (
                config.listener.take(),
                config.address.clone(),
                config
                    .tls_files()
                    .map(|(cert, key)| (cert.to_owned(), key.to_owned())),
                Timeouts {
                    read: config.read_timeout,
                    write: config.write_timeout,
                },
            )
        };

        let (listener, tls) = match supplied {
            Some(listener) => {
                listener.set_nonblocking(true)?;
                (TcpListener::from_std(listener)?, None)
            }
            None => {
                let tls = match tls_files {
                    Some((cert, key)) => Some(TlsConfig::from_pem_files(cert, key)?.acceptor()),
                    None => None,
                };
                (TcpListener::bind(&address).await?, tls)
            }
        };

        self.shutdown.send_replace(false);
        let mut shutdown = self.shutdown.subscribe();

        info!(
            address = %listener.local_addr()?,
            tls = tls.is_some(),
            "server listening"
        );

        let mut backoff = ACCEPT_BACKOFF_MIN;
        loop {
            let (stream, remote) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => {
                        backoff = ACCEPT_BACKOFF_MIN;
                        conn
                    }
                    Err(err) => {
                        warn!(error = %err, retry_in = ?backoff, "accept failed");
                        tokio::time::sleep(backoff).await;
                        backoff = next_accept_backoff(backoff);
                        continue;
                    }
                },
                _ = shutdown.changed() => {
                    info!("server stopped");
                    return Ok(());
                }
            };

            let server = Arc::clone(&self);
            let tls = tls.clone();
            tokio::spawn(async move {
                match tls {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(stream) => {
                            server
                                .serve_connection(TokioIo::new(stream), remote, true, timeouts)
                                .await
                        }
                        Err(err) => debug!(remote = %remote, error = %err, "TLS handshake failed"),
                    },
                    None => {
                        server
                            .serve_connection(TokioIo::new(stream), remote, false, timeouts)
                            .await
                    }
                }
            });
        }
    }

    /// Stop accepting connections. Connections already open finish on their own.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    async fn serve_connection<I>(
        self: Arc<Self>,
        io: TokioIo<I>,
        remote: SocketAddr,
        tls: bool,
        timeouts: Timeouts,
    ) where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let service = service_fn(move |req: hyper::Request<Incoming>| {
            let server = Arc::clone(&self);
            async move { server.handle(req, remote, tls, timeouts.write).await }
        });

        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new());
        if let Some(timeout) = timeouts.read {
            builder.header_read_timeout(timeout);
        }

        if let Err(err) = builder.serve_connection(io, service).await {
            debug!(remote = %remote, error = ?err, "error serving connection");
        }
    }

    async fn handle(
        self: Arc<Self>,
        req: hyper::Request<Incoming>,
        remote: SocketAddr,
        tls: bool,
        write_timeout: Option<Duration>,
    ) -> Result<hyper::Response<Full<Bytes>>, Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        let native_req = NativeRequest::from_http(hyper::Request::from_parts(parts, body))
            .with_remote_addr(remote)
            .with_tls(tls);
        let native_res = NativeResponse::new();

        let method = native_req.method().clone();
        let path = native_req.url().read().path().to_owned();

        let writer = native_res.clone();
        let dispatch =
            tokio::task::spawn_blocking(move || self.serve_http(&writer, &native_req));

        let outcome = match write_timeout {
            Some(limit) => match tokio::time::timeout(limit, dispatch).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let err = Error::ServiceUnavailable(format!(
                        "handler exceeded write timeout of {limit:?}"
                    ));
                    warn!(method = %method, path = %path, error = %err, "request timed out");
                    return Ok(status_only(err.status_code()));
                }
            },
            None => dispatch.await,
        };

        if let Err(err) = outcome {
            if err.is_panic() {
                error!(method = %method, path = %path, "handler panicked");
            } else {
                error!(method = %method, path = %path, error = %err, "handler task failed");
            }
            return Ok(status_only(StatusCode::INTERNAL_SERVER_ERROR));
        }

        Ok(native_res.into_http())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("address", &self.address())
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

/// Pass-through timeouts, copied out of the config once per `start`.
#[derive(Debug, Clone, Copy)]
struct Timeouts {
    read: Option<Duration>,
    write: Option<Duration>,
}

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

fn next_accept_backoff(current: Duration) -> Duration {
    (current * 2).min(ACCEPT_BACKOFF_MAX)
}

fn status_only(status: StatusCode) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Wrappers on loan to one request. Dropping the lease unbinds them and
/// returns all five to their pools.
struct Lease<'a> {
    pools: &'a Pools,
    request: Option<Box<Request>>,
    response: Option<Box<Response>>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(mut req) = self.request.take() {
            let (header, url) = req.unbind();
            if let Some(header) = header {
                self.pools.header.release(header);
            }
            if let Some(url) = url {
                self.pools.url.release(url);
            }
            self.pools.request.release(req);
        }

        if let Some(mut res) = self.response.take() {
            let (adapter, header) = res.unbind();
            if let Some(adapter) = adapter {
                self.pools.response_adapter.release(adapter);
            }
            if let Some(header) = header {
                self.pools.header.release(header);
            }
            self.pools.response.release(res);
        }
    }
}
