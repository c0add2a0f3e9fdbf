// Listener and transport configuration

use crate::Error;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Prefix for configuration read from the environment.
pub const ENV_PREFIX: &str = "GIRDER_";

/// How and where a [`Server`](super::standard::Server) listens.
///
/// `listener` wins over TLS, and TLS is used only when both the certificate
/// and the key file are set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, e.g. `127.0.0.1:1323`
    pub address: String,
    pub tls_cert_file: Option<String>,
    pub tls_key_file: Option<String>,
    /// Pre-bound listener to serve on instead of binding `address`
    #[serde(skip)]
    pub listener: Option<std::net::TcpListener>,
    /// Deadline for receiving request headers, in seconds
    #[serde(deserialize_with = "seconds")]
    pub read_timeout: Option<Duration>,
    /// Deadline for producing the response, in seconds
    #[serde(deserialize_with = "seconds")]
    pub write_timeout: Option<Duration>,
}

fn seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(secs) => timeout_from_secs(secs).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Zero, negative and non-finite values disable the timeout.
fn timeout_from_secs(secs: f64) -> Result<Option<Duration>, String> {
    if !secs.is_finite() || secs <= 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| format!("timeout of {secs} seconds: {e}"))
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_tls(mut self, cert_file: impl Into<String>, key_file: impl Into<String>) -> Self {
        self.tls_cert_file = Some(cert_file.into());
        self.tls_key_file = Some(key_file.into());
        self
    }

    pub fn with_listener(mut self, listener: std::net::TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Certificate and key paths, when both are configured.
    pub fn tls_files(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) if !cert.is_empty() && !key.is_empty() => Some((cert, key)),
            _ => None,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(format!("TOML parse error: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Read `GIRDER_*` variables, loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build from `(name, value)` pairs using the `GIRDER_` naming.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let Some(key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            match key {
                "ADDRESS" => config.address = value,
                "TLS_CERT_FILE" => config.tls_cert_file = Some(value),
                "TLS_KEY_FILE" => config.tls_key_file = Some(value),
                "READ_TIMEOUT" => config.read_timeout = parse_seconds(key, &value)?,
                "WRITE_TIMEOUT" => config.write_timeout = parse_seconds(key, &value)?,
                _ => {}
            }
        }
        Ok(config)
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Option<Duration>, Error> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{ENV_PREFIX}{key}: {e}")))?;
    timeout_from_secs(secs).map_err(|e| Error::Config(format!("{ENV_PREFIX}{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml() {
        let config = ServerConfig::from_toml_str(
            r#"
            address = "0.0.0.0:8443"
            tls_cert_file = "cert.pem"
            tls_key_file = "key.pem"
            read_timeout = 5
            write_timeout = 2.5
        "#,
        )
        .unwrap();

        assert_eq!(config.address, "0.0.0.0:8443");
        assert_eq!(config.tls_files(), Some(("cert.pem", "key.pem")));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.write_timeout, Some(Duration::from_millis(2500)));
        assert!(config.listener.is_none());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ServerConfig::from_toml_str("read_timeout = 0").unwrap();
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.address, "");
    }

    #[test]
    fn test_tls_requires_both_files() {
        let mut config = ServerConfig::new(":1323");
        config.tls_cert_file = Some("cert.pem".into());
        assert!(config.tls_files().is_none());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ServerConfig::from_toml_str("address = "),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "address = \"127.0.0.1:9000\"\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.address, "127.0.0.1:9000");

        assert!(ServerConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_from_vars() {
        let config = ServerConfig::from_vars([
            ("GIRDER_ADDRESS", "127.0.0.1:8080"),
            ("GIRDER_WRITE_TIMEOUT", "10"),
            ("OTHER_ADDRESS", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.address, "127.0.0.1:8080");
        assert_eq!(config.write_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.read_timeout, None);

        assert!(ServerConfig::from_vars([("GIRDER_READ_TIMEOUT", "soon")]).is_err());
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        assert!(matches!(
            ServerConfig::from_toml_str("read_timeout = 1e300"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ServerConfig::from_vars([("GIRDER_WRITE_TIMEOUT", "1e300")]),
            Err(Error::Config(_))
        ));

        let config = ServerConfig::from_vars([("GIRDER_READ_TIMEOUT", "-1")]).unwrap();
        assert_eq!(config.read_timeout, None);
    }
}
