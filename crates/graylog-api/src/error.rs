use thiserror::Error;

/// Top-level error type for the `graylog-api` crate.
///
/// "Not found" and business-rule refusals (pausing an already paused
/// stream, say) are deliberately absent: those come back as `Ok(false)` or
/// `Ok(None)` with the resource's error message set. Everything here is a
/// condition the caller has to handle.
#[derive(Debug, Error)]
pub enum Error {
    // ── Caller input ────────────────────────────────────────────────
    /// Malformed input caught before any I/O, or a 4xx (other than 404)
    /// returned by the server. The message carries the server's body when
    /// there was one.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Create was called without every field the resource requires.
    #[error("Missing required {resource} fields: {}", fields.join(", "))]
    MissingField {
        resource: &'static str,
        fields: Vec<&'static str>,
    },

    /// The payload did not match the server-advertised schema model.
    #[error("Payload rejected by schema model {model}: {}", problems.join("; "))]
    Schema { model: String, problems: Vec<String> },

    // ── Setup ───────────────────────────────────────────────────────
    /// Invalid session or object setup (double authentication, a rule
    /// used before being attached to a stream, ...).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Fatal ───────────────────────────────────────────────────────
    /// The server answered with a 5xx status.
    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// HTTP transport error (connection refused, DNS failure, timeout, ...).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for conditions that must never be swallowed:
    /// server-side failures and broken connections.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Transport(_))
    }

    /// Returns `true` when the caller's input was rejected, locally or by
    /// the server.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::MissingField { .. } | Self::Schema { .. }
        )
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
