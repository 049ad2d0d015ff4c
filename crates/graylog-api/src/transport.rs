// Transport configuration for building the session's reqwest::Client.
//
// TLS policy, timeout and the JSON default headers live here so the
// session only deals with URLs, credentials and status codes.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed Graylog nodes).
    DangerAcceptInvalid,
}

/// Transport configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Derive the TLS mode from the plain `use_tls` / `verify_tls` pair.
    ///
    /// Verification is only on when TLS is used *and* requested; a plain
    /// HTTP session never verifies anything.
    pub fn from_flags(use_tls: bool, verify_tls: bool) -> Self {
        let tls = if use_tls && verify_tls {
            TlsMode::System
        } else {
            TlsMode::DangerAcceptInvalid
        };
        Self {
            tls,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// Every request carries `Accept: application/json`; `Content-Type` is
    /// set per request by `RequestBuilder::json`.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("graylog-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
