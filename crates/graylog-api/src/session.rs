// Graylog REST session
//
// Wraps `reqwest::Client` with base-URL construction, Basic credentials and
// status-code classification. Resource endpoints are implemented as
// inherent methods on the resource types; this module only knows about
// paths, verbs and responses.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::resource::Document;
use crate::transport::TransportConfig;

/// Default port of the Graylog REST API.
pub const DEFAULT_PORT: u16 = 12900;

/// Everything needed to open a [`Session`] without touching the network.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub transport: TransportConfig,
    /// Validate create/update payloads against the server-advertised schema.
    pub validate_schemas: bool,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            use_tls: false,
            transport: TransportConfig::default(),
            validate_schemas: false,
        }
    }

    /// `{scheme}://{host}:{port}`
    pub fn base_url(&self) -> Result<Url, Error> {
        let scheme = if self.use_tls { "https" } else { "http" };
        Ok(Url::parse(&format!("{scheme}://{}:{}", self.host, self.port))?)
    }
}

// ── Status classification ────────────────────────────────────────────

/// How a response status should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// 404: reported as absence, never as an error.
    NotFound,
    /// Any other 4xx: the caller's request was rejected.
    ClientError,
    /// 5xx: fatal.
    ServerError,
}

impl StatusClass {
    pub fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::ServerError
        } else if status == StatusCode::NOT_FOUND {
            Self::NotFound
        } else if status.is_success() {
            Self::Success
        } else {
            // 4xx, and the 1xx/3xx statuses a JSON API never answers with
            Self::ClientError
        }
    }
}

/// Raw outcome of one request: status, body text and the parsed JSON body
/// when the server sent one.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub text: String,
}

impl ApiResponse {
    pub fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }

    /// Human-readable description of what the server said.
    pub fn message(&self) -> String {
        let text = self.text.trim();
        if text.is_empty() {
            self.status.to_string()
        } else {
            text.to_owned()
        }
    }

    /// The JSON body, or `Null` if there was none.
    pub fn body_or_null(&self) -> Value {
        self.body.clone().unwrap_or(Value::Null)
    }

    /// Fail with [`Error::Server`] on a 5xx, pass everything else through.
    pub fn check_fatal(&self) -> Result<(), Error> {
        if self.class() == StatusClass::ServerError {
            return Err(Error::Server {
                status: self.status.as_u16(),
                body: self.text.clone(),
            });
        }
        Ok(())
    }

    /// Fail on any non-success status: 5xx as [`Error::Server`], 4xx
    /// (404 included) as [`Error::Validation`] carrying the body.
    pub fn check_success(&self) -> Result<(), Error> {
        self.check_fatal()?;
        match self.class() {
            StatusClass::Success => Ok(()),
            _ => Err(Error::validation(format!(
                "HTTP {}: {}",
                self.status.as_u16(),
                self.message()
            ))),
        }
    }

    /// Take the body as a JSON object.
    pub fn into_document(self) -> Result<Document, Error> {
        match self.body {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(Error::Deserialization {
                message: format!("expected a JSON object (HTTP {})", self.status.as_u16()),
                body: self.text,
            }),
        }
    }
}

// ── Paths ────────────────────────────────────────────────────────────

/// A request path relative to the base URL.
///
/// Fixed parts are string literals and may span several segments. Values
/// added with [`segment`](Self::segment) always become exactly one
/// percent-encoded segment: an id like `a/../b` or `john?x=1` cannot
/// leave its collection or inject a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    pub fn new(fixed: &'static str) -> Self {
        Self {
            segments: Vec::new(),
        }
        .then(fixed)
    }

    /// Append fixed segments (`"alerts/receivers"`).
    pub fn then(mut self, fixed: &'static str) -> Self {
        self.segments.extend(
            fixed
                .split('/')
                .filter(|part| !part.is_empty())
                .map(String::from),
        );
        self
    }

    /// Append one id or keyword as a single segment.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// The top-level collection (`streams` for `streams/{id}/rules`).
    pub fn root(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }
}

impl From<&'static str> for ApiPath {
    fn from(fixed: &'static str) -> Self {
        Self::new(fixed)
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

// ── Session ──────────────────────────────────────────────────────────

struct BasicCredentials {
    username: String,
    password: SecretString,
}

/// A connection to one Graylog server.
///
/// Created once per target and shared (via `Arc`) by every resource object
/// bound to it. Credentials and the schema cache use interior mutability so
/// the session can be shared before authentication is configured.
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    credentials: RwLock<Option<BasicCredentials>>,
    validate_schemas: bool,
    /// Memoized `/api-docs/{collection}` documents. Never expires; a schema
    /// change on the server is only seen after `clear_schema_cache`.
    pub(crate) schemas: RwLock<HashMap<String, Arc<Value>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .field("validate_schemas", &self.validate_schemas)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session for `host:port`. No network call is made.
    ///
    /// TLS certificates are verified only when both `use_tls` and
    /// `verify_tls` are set.
    pub fn connect(host: &str, port: u16, use_tls: bool, verify_tls: bool) -> Result<Self, Error> {
        let config = SessionConfig {
            host: host.to_owned(),
            port,
            use_tls,
            transport: TransportConfig::from_flags(use_tls, verify_tls),
            validate_schemas: false,
        };
        Self::from_config(&config)
    }

    /// Build a session from a full [`SessionConfig`].
    pub fn from_config(config: &SessionConfig) -> Result<Self, Error> {
        if config.host.is_empty() {
            return Err(Error::configuration("host must not be empty"));
        }
        let base_url = config.base_url()?;
        let http = config.transport.build_client()?;
        debug!(url = %base_url, "session configured");
        Ok(Self::with_client(http, base_url).with_schema_validation(config.validate_schemas))
    }

    /// Wrap a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the client's default headers and TLS
    /// settings.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            credentials: RwLock::new(None),
            validate_schemas: false,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Toggle client-side schema validation of create/update payloads.
    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schemas = enabled;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn validates_schemas(&self) -> bool {
        self.validate_schemas
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Attach Basic credentials to every subsequent request.
    ///
    /// May only be called once per session.
    pub fn authenticate(&self, username: &str, password: SecretString) -> Result<(), Error> {
        let mut guard = self.credentials.write().expect("credentials lock poisoned");
        if guard.is_some() {
            return Err(Error::configuration("authentication already configured"));
        }
        debug!(username, "configuring basic authentication");
        *guard = Some(BasicCredentials {
            username: username.to_owned(),
            password,
        });
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials
            .read()
            .expect("credentials lock poisoned")
            .is_some()
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.credentials.read().expect("credentials lock poisoned");
        match guard.as_ref() {
            Some(creds) => {
                builder.basic_auth(&creds.username, Some(creds.password.expose_secret()))
            }
            None => builder,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/{segment}/...`, each segment percent-encoded.
    ///
    /// Empty, `.` and `..` segments are rejected: the URL parser would
    /// drop or resolve them and the request would hit another endpoint.
    pub fn url(&self, path: &ApiPath) -> Result<Url, Error> {
        if let Some(bad) = path
            .segments
            .iter()
            .find(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(Error::validation(format!(
                "invalid path segment '{bad}' in '{path}'"
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::configuration("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(&path.segments);
        Ok(url)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Issue one HTTP call and return the raw status and body.
    ///
    /// Only transport failures are errors here; status handling is the
    /// caller's job (see [`StatusClass`]).
    pub async fn request(
        &self,
        method: Method,
        path: impl Into<ApiPath>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        self.request_with_query(method, path, &[], body).await
    }

    /// Same as [`request`](Self::request) with query parameters.
    pub async fn request_with_query(
        &self,
        method: Method,
        path: impl Into<ApiPath>,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(&path.into())?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let builder = self.apply_auth(builder);

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        trace!(status = status.as_u16(), bytes = text.len(), "response received");

        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        Ok(ApiResponse { status, body, text })
    }

    pub async fn get(&self, path: impl Into<ApiPath>) -> Result<ApiResponse, Error> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(
        &self,
        path: impl Into<ApiPath>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put(&self, path: impl Into<ApiPath>, body: &Value) -> Result<ApiResponse, Error> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: impl Into<ApiPath>) -> Result<ApiResponse, Error> {
        self.request(Method::DELETE, path, None).await
    }
}
