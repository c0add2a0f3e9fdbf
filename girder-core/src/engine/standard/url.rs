// Pooled view over the transport request target

use crate::Error;
use crate::engine::native::NativeUrl;
use http::Uri;
use http::uri::PathAndQuery;

/// URL of the current request, bound to the transport's copy.
#[derive(Debug, Default)]
pub struct Url {
    url: Option<NativeUrl>,
}

impl Url {
    pub(crate) const fn unbound() -> Self {
        Self { url: None }
    }

    pub(crate) fn reset(&mut self, url: NativeUrl) {
        self.url = Some(url);
    }

    pub(crate) fn clear(&mut self) {
        self.url = None;
    }

    pub fn is_bound(&self) -> bool {
        self.url.is_some()
    }

    pub fn native(&self) -> Option<&NativeUrl> {
        self.url.as_ref()
    }

    fn read<R: Default>(&self, f: impl FnOnce(&Uri) -> R) -> R {
        self.url.as_ref().map(|u| f(&u.read())).unwrap_or_default()
    }

    pub fn path(&self) -> String {
        self.read(|uri| uri.path().to_owned())
    }

    /// Replace the path, keeping scheme, authority and query.
    pub fn set_path(&self, path: &str) -> Result<(), Error> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        let mut uri = url.write();
        let path_and_query = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_owned(),
        };
        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(
            PathAndQuery::try_from(path_and_query)
                .map_err(|e| Error::InvalidUri(format!("{path}: {e}")))?,
        );
        *uri = Uri::from_parts(parts).map_err(|e| Error::InvalidUri(e.to_string()))?;
        Ok(())
    }

    /// Raw query string without the leading `?`.
    pub fn query_string(&self) -> String {
        self.read(|uri| uri.query().unwrap_or_default().to_owned())
    }

    /// Decoded query pairs, in order.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.read(|uri| {
            uri.query()
                .and_then(|q| serde_urlencoded::from_str(q).ok())
                .unwrap_or_default()
        })
    }

    /// First decoded value for `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_params()
            .into_iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }
}

impl std::fmt::Display for Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{}", url.read()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn bound(uri: &'static str) -> (Url, NativeUrl) {
        let native: NativeUrl = Arc::new(RwLock::new(Uri::from_static(uri)));
        let mut url = Url::default();
        url.reset(Arc::clone(&native));
        (url, native)
    }

    #[test]
    fn test_path_and_query() {
        let (url, _) = bound("/search?q=rust%20lang&page=2&q=second");
        assert_eq!(url.path(), "/search");
        assert_eq!(url.query_string(), "q=rust%20lang&page=2&q=second");
        assert_eq!(url.query_param("q").as_deref(), Some("rust lang"));
        assert_eq!(url.query_param("page").as_deref(), Some("2"));
        assert_eq!(url.query_param("missing"), None);
        assert_eq!(url.query_params().len(), 3);
    }

    #[test]
    fn test_set_path_keeps_query() {
        let (url, native) = bound("http://example.com/old?keep=1");
        url.set_path("/new").unwrap();
        assert_eq!(native.read().to_string(), "http://example.com/new?keep=1");
        assert_eq!(url.to_string(), "http://example.com/new?keep=1");
    }

    #[test]
    fn test_set_path_rejects_garbage() {
        let (url, _) = bound("/ok");
        assert!(matches!(url.set_path("/a b"), Err(Error::InvalidUri(_))));
        assert_eq!(url.path(), "/ok");
    }

    #[test]
    fn test_unbound_reads_empty() {
        let url = Url::default();
        assert_eq!(url.path(), "");
        assert_eq!(url.query_param("q"), None);
        assert!(url.set_path("/x").is_ok());
        assert_eq!(url.to_string(), "");
    }
}
