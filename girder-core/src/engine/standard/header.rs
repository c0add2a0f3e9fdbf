// Pooled view over a transport header collection

use crate::Error;
use crate::engine::native::NativeHeaders;
use http::{HeaderMap, HeaderName, HeaderValue};

/// Header collection of the current request or response.
///
/// Holds no storage of its own: every read and write goes to the transport
/// collection it is bound to. An unbound header reads as empty and ignores
/// writes.
#[derive(Debug, Default)]
pub struct Header {
    headers: Option<NativeHeaders>,
}

impl Header {
    pub(crate) const fn unbound() -> Self {
        Self { headers: None }
    }

    pub(crate) fn reset(&mut self, headers: NativeHeaders) {
        self.headers = Some(headers);
    }

    pub(crate) fn clear(&mut self) {
        self.headers = None;
    }

    pub fn is_bound(&self) -> bool {
        self.headers.is_some()
    }

    /// The bound transport collection.
    pub fn native(&self) -> Option<&NativeHeaders> {
        self.headers.as_ref()
    }

    fn read<R>(&self, f: impl FnOnce(&HeaderMap) -> R) -> Option<R> {
        self.headers.as_ref().map(|h| f(&h.read()))
    }

    fn write<R>(&self, f: impl FnOnce(&mut HeaderMap) -> R) -> Option<R> {
        self.headers.as_ref().map(|h| f(&mut h.write()))
    }

    /// First value for `key`, if present and valid UTF-8.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read(|map| {
            map.get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        })
        .flatten()
    }

    /// Every value for `key`.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.read(|map| {
            map.get_all(key)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
    }

    /// Replace all values for `key`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let (name, value) = parse_pair(key, value)?;
        self.write(|map| map.insert(name, value));
        Ok(())
    }

    /// Append a value for `key`.
    pub fn add(&self, key: &str, value: &str) -> Result<(), Error> {
        let (name, value) = parse_pair(key, value)?;
        self.write(|map| map.append(name, value));
        Ok(())
    }

    pub fn del(&self, key: &str) {
        self.write(|map| map.remove(key));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read(|map| map.contains_key(key)).unwrap_or(false)
    }

    /// Distinct header names, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read(|map| map.keys().map(|k| k.as_str().to_owned()).collect())
            .unwrap_or_default()
    }

    /// Number of values, counting repeats.
    pub fn len(&self) -> usize {
        self.read(HeaderMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_pair(key: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
    let value =
        HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn bound() -> (Header, NativeHeaders) {
        let native = NativeHeaders::default();
        let mut header = Header::default();
        header.reset(Arc::clone(&native));
        (header, native)
    }

    #[test]
    fn test_reads_and_writes_reach_native() {
        let (header, native) = bound();
        header.set("X-Trace", "abc").unwrap();
        assert_eq!(native.read()["x-trace"], "abc");

        native
            .write()
            .insert("x-from-native", HeaderValue::from_static("1"));
        assert_eq!(header.get("X-From-Native").as_deref(), Some("1"));
        assert!(header.contains("x-from-native"));
    }

    #[test]
    fn test_add_and_get_all() {
        let (header, _) = bound();
        header.add("accept", "text/html").unwrap();
        header.add("accept", "application/json").unwrap();
        assert_eq!(header.get_all("accept"), vec!["text/html", "application/json"]);
        assert_eq!(header.get("accept").as_deref(), Some("text/html"));
        assert_eq!(header.len(), 2);
        assert_eq!(header.keys(), vec!["accept"]);

        header.set("accept", "*/*").unwrap();
        assert_eq!(header.get_all("accept"), vec!["*/*"]);

        header.del("accept");
        assert!(header.is_empty());
    }

    #[test]
    fn test_rebind_replaces_previous_collection() {
        let (mut header, first) = bound();
        header.set("x-request", "first").unwrap();

        let second = NativeHeaders::default();
        header.reset(Arc::clone(&second));
        assert_eq!(header.get("x-request"), None);
        assert!(Arc::ptr_eq(header.native().unwrap(), &second));

        header.set("x-request", "second").unwrap();
        assert_eq!(first.read()["x-request"], "first");
    }

    #[test]
    fn test_unbound_is_inert() {
        let (mut header, native) = bound();
        header.clear();
        assert!(!header.is_bound());
        header.set("x-late", "1").unwrap();
        assert!(native.read().is_empty());
        assert_eq!(header.get("x-late"), None);
    }

    #[test]
    fn test_invalid_pair_rejected() {
        let (header, _) = bound();
        assert!(matches!(
            header.set("bad name", "v"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            header.add("x-ok", "line\nbreak"),
            Err(Error::InvalidHeader(_))
        ));
    }
}
