//! TLS client setup.
//!
//! Builds the `rustls` client configuration from [`TlsConfig`]: native
//! root certificates when the server certificate is verified, an accepting
//! verifier when it is not, and an optional PEM client certificate.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use rustls_pemfile::{certs, pkcs8_private_keys};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    self, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::warn;

use crate::config::TlsConfig;

/// Build a connector for the given settings.
pub fn connector(config: &TlsConfig) -> io::Result<TlsConnector> {
    let builder = if config.verify_server_certificate {
        ClientConfig::builder().with_root_certificates(native_roots())
    } else {
        warn!("server certificate verification disabled");
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
    };

    let client_config = match (&config.client_certificate, &config.client_key) {
        (Some(cert_path), key_path) => {
            let chain = load_certs(cert_path)?;
            let key = load_key(key_path.as_deref().unwrap_or(cert_path))?;
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        }
        (None, _) => builder.with_no_client_auth(),
    };

    Ok(TlsConnector::from(Arc::new(client_config)))
}

/// The name presented in SNI and checked against the server certificate.
pub fn server_name(host: &str) -> io::Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

fn native_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for cert in loaded.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "failed to add root certificate");
        }
    }
    for e in &loaded.errors {
        warn!(error = %e, "error loading native certificates");
    }
    roots
}

fn load_certs(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let chain = certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if chain.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no certificates in {}", path.display()),
        ));
    }
    Ok(chain)
}

fn load_key(path: &Path) -> io::Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(File::open(path)?);
    pkcs8_private_keys(&mut reader)
        .next()
        .transpose()?
        .map(PrivateKeyDer::from)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no PKCS#8 private key in {}", path.display()),
            )
        })
}

/// Accepts any server certificate. Only installed when verification is
/// turned off in the configuration.
#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        match rustls::crypto::CryptoProvider::get_default() {
            Some(provider) => provider.signature_verification_algorithms.supported_schemes(),
            None => rustls::crypto::aws_lc_rs::default_provider()
                .signature_verification_algorithms
                .supported_schemes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_server_name() {
        assert!(server_name("irc.example.net").is_ok());
        assert!(server_name("192.0.2.1").is_ok());
        assert!(server_name("not a host").is_err());
    }

    #[test]
    fn test_missing_certificate_file() {
        let config = TlsConfig {
            enabled: true,
            verify_server_certificate: false,
            client_certificate: Some("/nonexistent/client.pem".into()),
            client_key: None,
        };
        assert!(connector(&config).is_err());
    }

    #[test]
    fn test_empty_certificate_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a pem").unwrap();
        let err = load_certs(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_unverified_connector_builds() {
        let config = TlsConfig {
            enabled: true,
            verify_server_certificate: false,
            client_certificate: None,
            client_key: None,
        };
        assert!(connector(&config).is_ok());
    }
}
