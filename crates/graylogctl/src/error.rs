//! CLI error types with miette diagnostics.
//!
//! Maps `graylog_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text. Nagios subcommands never surface these: they
//! print an `UNKNOWN` line instead.

use miette::Diagnostic;
use thiserror::Error;

use graylog_api::Error as ApiError;
use graylog_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const SERVER: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Graylog at {url}")]
    #[diagnostic(
        code(graylogctl::connection_failed),
        help(
            "Check that the server is running and the REST API port is reachable.\n\
             Try: graylogctl -h HOST -p PORT --tls -k users list"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(graylogctl::tls_error),
        help("Use --insecure (-k) for self-signed certificates, or set ca_cert in your profile.")
    )]
    TlsError { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(graylogctl::no_credentials),
        help(
            "Pass -u USER -P PASSWORD, set GRAYLOG_USERNAME / GRAYLOG_PASSWORD,\n\
             or run: graylogctl -u USER -P PASSWORD config set-profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(graylogctl::not_found),
        help("Run: graylogctl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(graylogctl::refused))]
    Refused { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server error (HTTP {status}): {message}")]
    #[diagnostic(code(graylogctl::server_error))]
    Server { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(graylogctl::bad_response), help("Run with -vv to see the raw exchange."))]
    BadResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(graylogctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(graylogctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: graylogctl -h HOST config set-profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No Graylog server configured")]
    #[diagnostic(
        code(graylogctl::no_config),
        help(
            "Pass --host (-h), set GRAYLOG_HOST, or create a profile.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(graylogctl::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(graylogctl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Server { .. } => exit_code::SERVER,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── ApiError → CliError mapping ──────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(source) => CliError::ConnectionFailed {
                url: source
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(source),
            },

            ApiError::Tls(reason) => CliError::TlsError { reason },

            ApiError::Server { status, body } => CliError::Server {
                status,
                message: body,
            },

            ApiError::InvalidUrl(e) => CliError::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },

            ApiError::Configuration { message } => CliError::Validation {
                field: "session".into(),
                reason: message,
            },

            ApiError::Deserialization { message, .. } => CliError::BadResponse { message },

            other @ (ApiError::Validation { .. }
            | ApiError::MissingField { .. }
            | ApiError::Schema { .. }) => CliError::Validation {
                field: "input".into(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        let server: CliError = ApiError::Server {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert_eq!(server.exit_code(), exit_code::SERVER);

        let missing: CliError = ApiError::MissingField {
            resource: "user",
            fields: vec!["email"],
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::USAGE);
        assert!(missing.to_string().contains("email"));
    }
}
