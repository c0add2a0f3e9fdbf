//! TLS support for the standard server.
//!
//! Loads a PEM certificate chain and private key into a rustls server
//! configuration that the accept loop wraps connections with.

use crate::Error;
use rustls::{
    ServerConfig,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use rustls_pemfile::{certs, private_key};
use std::{fs::File, io::BufReader, path::Path, sync::Arc};
use tokio_rustls::TlsAcceptor;

/// TLS configuration for HTTPS serving
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub server_config: Arc<ServerConfig>,
}

impl TlsConfig {
    /// Load from certificate and key files (PEM format)
    pub fn from_pem_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let certs = load_certs(cert_path.as_ref())?;
        let key = load_private_key(key_path.as_ref())?;

        Self::from_pem_parts(certs, key)
    }

    /// Load from certificate and key bytes (PEM format)
    pub fn from_pem_bytes(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, Error> {
        let certs = parse_certs(cert_pem)?;
        let key = parse_private_key(key_pem)?;

        Self::from_pem_parts(certs, key)
    }

    fn from_pem_parts(
        certs: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self, Error> {
        if certs.is_empty() {
            return Err(Error::Tls("No certificates found".to_string()));
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("Unsupported protocol versions: {}", e)))?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| Error::Tls(format!("Failed to create TLS config: {}", e)))?;

        // The server speaks HTTP/1.1 only
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Self {
            server_config: Arc::new(config),
        })
    }

    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(Arc::clone(&self.server_config))
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, Error> {
    let file = File::open(path)
        .map_err(|e| Error::Tls(format!("Failed to open certificate file: {}", e)))?;

    let mut reader = BufReader::new(file);

    certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("Failed to parse certificates: {}", e)))
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, Error> {
    let file = File::open(path).map_err(|e| Error::Tls(format!("Failed to open key file: {}", e)))?;

    let mut reader = BufReader::new(file);

    private_key(&mut reader)
        .map_err(|e| Error::Tls(format!("Failed to read private key: {}", e)))?
        .ok_or_else(|| Error::Tls("No private key found in file".to_string()))
}

fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, Error> {
    let mut reader = BufReader::new(pem);

    certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("Failed to parse certificates: {}", e)))
}

fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, Error> {
    let mut reader = BufReader::new(pem);

    private_key(&mut reader)
        .map_err(|e| Error::Tls(format!("Failed to read private key: {}", e)))?
        .ok_or_else(|| Error::Tls("No private key found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files() {
        let err = TlsConfig::from_pem_files("/nonexistent/cert.pem", "/nonexistent/key.pem")
            .unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn test_empty_pem() {
        assert!(matches!(
            TlsConfig::from_pem_bytes(b"", b""),
            Err(Error::Tls(_))
        ));
    }

    #[test]
    fn test_key_without_certificate() {
        let garbage = b"-----BEGIN CERTIFICATE-----\nnot base64!\n-----END CERTIFICATE-----\n";
        assert!(TlsConfig::from_pem_bytes(garbage, b"").is_err());
    }

    #[test]
    fn test_loads_pem_pair_from_files() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
        let tls = TlsConfig::from_pem_files(format!("{dir}/cert.pem"), format!("{dir}/key.pem"))
            .unwrap();
        assert_eq!(tls.server_config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
