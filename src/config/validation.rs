//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::ClientConfig;
use slirc_proto::LineCodec;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("server.port must not be 0")]
    ZeroPort,
    #[error("server.addresses contains an empty entry")]
    EmptyAddress,
    #[error("server.encoding is not a known encoding: {0}")]
    UnknownEncoding(String),
    #[error("tls.client_key requires tls.client_certificate")]
    KeyWithoutCertificate,
    #[error("tls.client_certificate does not exist: {0}")]
    CertificateNotFound(PathBuf),
    #[error("tls.client_key does not exist: {0}")]
    KeyNotFound(PathBuf),
    #[error("proxy.host is required")]
    MissingProxyHost,
    #[error("scheduler.send_delay must be greater than 0")]
    ZeroSendDelay,
    #[error("keepalive.check_interval must be greater than 0")]
    ZeroCheckInterval,
    #[error("keepalive.ping_timeout must exceed keepalive.ping_interval")]
    TimeoutNotAboveInterval,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.server.addresses.iter().any(|a| a.trim().is_empty()) {
        errors.push(ValidationError::EmptyAddress);
    }
    if LineCodec::new(&config.server.encoding).is_err() {
        errors.push(ValidationError::UnknownEncoding(config.server.encoding.clone()));
    }

    // TLS validation
    let tls = &config.tls;
    if tls.client_key.is_some() && tls.client_certificate.is_none() {
        errors.push(ValidationError::KeyWithoutCertificate);
    }
    if let Some(cert) = &tls.client_certificate
        && !Path::new(cert).exists()
    {
        errors.push(ValidationError::CertificateNotFound(cert.clone()));
    }
    if let Some(key) = &tls.client_key
        && !Path::new(key).exists()
    {
        errors.push(ValidationError::KeyNotFound(key.clone()));
    }

    if let Some(proxy) = &config.proxy
        && proxy.host.trim().is_empty()
    {
        errors.push(ValidationError::MissingProxyHost);
    }

    if config.scheduler.send_delay.is_zero() {
        errors.push(ValidationError::ZeroSendDelay);
    }
    if config.keepalive.check_interval.is_zero() {
        errors.push(ValidationError::ZeroCheckInterval);
    }
    if config.keepalive.ping_timeout <= config.keepalive.ping_interval {
        errors.push(ValidationError::TimeoutNotAboveInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_passes() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ClientConfig::default();
        config.server.port = 0;
        config.scheduler.send_delay = Duration::ZERO;
        config.keepalive.ping_timeout = config.keepalive.ping_interval;

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroPort)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroSendDelay)));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::TimeoutNotAboveInterval))
        );
    }

    #[test]
    fn test_missing_client_certificate_fails() {
        let mut config = ClientConfig::default();
        config.tls.client_certificate = Some("/nonexistent/cert.pem".into());

        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::CertificateNotFound(_)))
        );
    }

    #[test]
    fn test_key_without_certificate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.pem");
        std::fs::write(&key, "").unwrap();

        let mut config = ClientConfig::default();
        config.tls.client_key = Some(key);
        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::KeyWithoutCertificate))
        );
    }
}
