// Pooled request wrapper

use super::{Header, Url};
use crate::engine::native::NativeRequest;
use bytes::Bytes;
use http::{Method, header};

/// The request currently being served.
///
/// Composite of the transport request and two pooled sub-wrappers bound to
/// its header and URL collections. All three are replaced together by
/// `reset` and dropped together by `unbind`.
#[derive(Debug, Default)]
pub struct Request {
    native: Option<NativeRequest>,
    header: Option<Box<Header>>,
    url: Option<Box<Url>>,
}

static UNBOUND_HEADER: Header = Header::unbound();
static UNBOUND_URL: Url = Url::unbound();

impl Request {
    /// Bind to a transport request. `header` and `url` must already be bound
    /// to that request's collections.
    pub(crate) fn reset(&mut self, native: NativeRequest, header: Box<Header>, url: Box<Url>) {
        self.native = Some(native);
        self.header = Some(header);
        self.url = Some(url);
    }

    /// Drop the transport binding and hand back the sub-wrappers.
    pub(crate) fn unbind(&mut self) -> (Option<Box<Header>>, Option<Box<Url>>) {
        self.native = None;
        let mut header = self.header.take();
        let mut url = self.url.take();
        if let Some(header) = header.as_mut() {
            header.clear();
        }
        if let Some(url) = url.as_mut() {
            url.clear();
        }
        (header, url)
    }

    /// The transport request, if bound.
    pub fn native(&self) -> Option<&NativeRequest> {
        self.native.as_ref()
    }

    pub fn header(&self) -> &Header {
        self.header.as_deref().unwrap_or(&UNBOUND_HEADER)
    }

    pub fn url(&self) -> &Url {
        self.url.as_deref().unwrap_or(&UNBOUND_URL)
    }

    pub fn method(&self) -> Method {
        self.native
            .as_ref()
            .map(|r| r.method().clone())
            .unwrap_or_default()
    }

    pub fn is_tls(&self) -> bool {
        self.native.as_ref().is_some_and(NativeRequest::is_tls)
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_tls() { "https" } else { "http" }
    }

    /// Host from the `Host` header, falling back to the URI authority.
    pub fn host(&self) -> String {
        self.header().get(header::HOST.as_str()).unwrap_or_else(|| {
            self.native
                .as_ref()
                .and_then(|r| r.url().read().authority().map(|a| a.to_string()))
                .unwrap_or_default()
        })
    }

    /// Path and query as sent by the client.
    pub fn uri(&self) -> String {
        self.native
            .as_ref()
            .and_then(|r| r.url().read().path_and_query().map(|pq| pq.to_string()))
            .unwrap_or_default()
    }

    pub fn referer(&self) -> String {
        self.header()
            .get(header::REFERER.as_str())
            .unwrap_or_default()
    }

    pub fn user_agent(&self) -> String {
        self.header()
            .get(header::USER_AGENT.as_str())
            .unwrap_or_default()
    }

    /// `Content-Length` if sent, otherwise the collected body size.
    pub fn content_length(&self) -> u64 {
        self.header()
            .get(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| self.body().len() as u64)
    }

    pub fn remote_address(&self) -> String {
        self.native
            .as_ref()
            .and_then(NativeRequest::remote_addr)
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    pub fn body(&self) -> Bytes {
        self.native
            .as_ref()
            .map(|r| r.body().clone())
            .unwrap_or_default()
    }

    /// Decoded form fields: the url-encoded body for form posts, the query
    /// string otherwise.
    pub fn form_params(&self) -> Vec<(String, String)> {
        let is_form = self
            .header()
            .get(header::CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            serde_urlencoded::from_bytes(&self.body()).unwrap_or_default()
        } else {
            self.url().query_params()
        }
    }

    pub fn form_value(&self, name: &str) -> Option<String> {
        self.form_params()
            .into_iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }
}
