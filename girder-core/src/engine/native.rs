//! Native transport primitives.
//!
//! These are the objects the transport hands to the framework for every
//! request: a request, a response writer, and the header and URL collections
//! they own. Collections are shared handles, so a framework wrapper bound to
//! one observes every write made through the native object and vice versa.
//!
//! Native handlers and middleware are written directly against these types
//! and reach the framework through `wrap_handler` / `wrap_middleware`.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, Version};
use http_body_util::Full;
use parking_lot::{Mutex, RwLock};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Transport-owned header collection.
pub type NativeHeaders = Arc<RwLock<HeaderMap>>;

/// Transport-owned request target.
pub type NativeUrl = Arc<RwLock<Uri>>;

/// A request as delivered by the transport.
///
/// Cloning is cheap and yields a handle to the same header and URL
/// collections.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    method: Method,
    version: Version,
    headers: NativeHeaders,
    url: NativeUrl,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    tls: bool,
}

impl NativeRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            version: Version::HTTP_11,
            headers: NativeHeaders::default(),
            url: Arc::new(RwLock::new(uri)),
            body: Bytes::new(),
            remote_addr: None,
            tls: false,
        }
    }

    /// Take over an `http::Request` whose body has already been collected.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            version: parts.version,
            headers: Arc::new(RwLock::new(parts.headers)),
            url: Arc::new(RwLock::new(parts.uri)),
            body,
            remote_addr: None,
            tls: false,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.write().append(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &NativeHeaders {
        &self.headers
    }

    pub fn url(&self) -> &NativeUrl {
        &self.url
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }
}

/// The writer contract of the transport.
///
/// Headers must be set before the first `write_header` or `write` call;
/// `write` without a prior `write_header` implies `200 OK`.
pub trait ResponseWriter {
    /// The header collection that will be sent with the response.
    fn headers(&self) -> NativeHeaders;

    /// Send the status line. Only the first call has any effect.
    fn write_header(&self, status: StatusCode);

    /// Append to the response body.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
}

#[derive(Debug, Default)]
struct WriterState {
    status: Option<StatusCode>,
    body: BytesMut,
}

/// The transport's live response.
///
/// Cloning yields another handle to the same response.
#[derive(Debug, Clone, Default)]
pub struct NativeResponse {
    headers: NativeHeaders,
    state: Arc<Mutex<WriterState>>,
}

impl NativeResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status sent so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.state.lock().status
    }

    /// Copy of the body written so far.
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().body)
    }

    /// Whether both handles point at the same transport response.
    pub fn ptr_eq(&self, other: &NativeResponse) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Finish the response and hand it to hyper.
    ///
    /// Drains this handle; other clones observe an empty response afterwards.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let headers = std::mem::take(&mut *self.headers.write());
        let state = std::mem::take(&mut *self.state.lock());

        let mut response = http::Response::new(Full::new(state.body.freeze()));
        *response.status_mut() = state.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseWriter for NativeResponse {
    fn headers(&self) -> NativeHeaders {
        Arc::clone(&self.headers)
    }

    fn write_header(&self, status: StatusCode) {
        let mut state = self.state.lock();
        if let Some(sent) = state.status {
            warn!(sent = %sent, ignored = %status, "superfluous write_header call");
            return;
        }
        state.status = Some(status);
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.status.get_or_insert(StatusCode::OK);
        state.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// A handler written against the transport's own conventions.
pub trait NativeHandler {
    fn serve_http(&self, w: &dyn ResponseWriter, r: &NativeRequest);
}

impl<F> NativeHandler for F
where
    F: Fn(&dyn ResponseWriter, &NativeRequest),
{
    fn serve_http(&self, w: &dyn ResponseWriter, r: &NativeRequest) {
        self(w, r)
    }
}

/// A transport-level middleware: takes the next handler and returns the
/// handler that wraps it.
pub trait NativeMiddleware: Send + Sync {
    fn wrap<'a>(&self, next: &'a dyn NativeHandler) -> Box<dyn NativeHandler + 'a>;
}

impl<F> NativeMiddleware for F
where
    F: for<'a> Fn(&'a dyn NativeHandler) -> Box<dyn NativeHandler + 'a> + Send + Sync,
{
    fn wrap<'a>(&self, next: &'a dyn NativeHandler) -> Box<dyn NativeHandler + 'a> {
        self(next)
    }
}
