//! Listener TLS material.

use axum_server::tls_rustls::RustlsConfig;
use std::io;
use std::path::Path;

use crate::config::TlsConfig;

/// Read the PEM certificate chain and private key named by `tls`.
pub async fn load_tls_config(tls: &TlsConfig) -> io::Result<RustlsConfig> {
    let cert = require_file("certificate", &tls.cert_path)?;
    let key = require_file("private key", &tls.key_path)?;

    let config = RustlsConfig::from_pem_file(cert, key).await?;
    tracing::info!(cert = %tls.cert_path, "TLS material loaded");
    Ok(config)
}

fn require_file<'a>(what: &str, path: &'a str) -> io::Result<&'a Path> {
    let path = Path::new(path);
    if path.is_file() {
        Ok(path)
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("TLS {what} not found at {}", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_certificate() {
        let tls = TlsConfig {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("certificate"));
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_after_certificate() {
        let cert = std::env::temp_dir().join(format!("relay-gateway-cert-{}.pem", std::process::id()));
        std::fs::write(&cert, "not a real certificate").unwrap();

        let tls = TlsConfig {
            cert_path: cert.to_string_lossy().into_owned(),
            key_path: "/nonexistent/key.pem".into(),
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("private key"));

        let _ = std::fs::remove_file(&cert);
    }
}
