// Generic resource lifecycle
//
// `Resource<K>` implements create / find / load / update / delete / backup
// once, parameterized by a `ResourceKind` that names the collection, the
// identity field and the fields required on create. Concrete resources
// (users, streams, rules, dashboards) are type aliases over this struct
// plus inherent `impl Resource<TheirKind>` blocks for their own endpoints.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::schema;
use crate::session::{ApiPath, ApiResponse, Session, StatusClass};

/// A JSON object as sent to / received from the server.
pub type Document = serde_json::Map<String, Value>;

/// What the client knows about the server-side entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResourceState {
    /// Nothing created, loaded or hydrated yet.
    #[default]
    Unloaded,
    /// Last-known server representation.
    Loaded(Document),
    /// Deleted on the server; the object may be reused for a new identity.
    Deleted,
}

impl ResourceState {
    pub fn data(&self) -> Option<&Document> {
        match self {
            Self::Loaded(doc) => Some(doc),
            Self::Unloaded | Self::Deleted => None,
        }
    }
}

/// A side request an update field is routed to instead of the regular
/// update body (the user password, for instance).
#[derive(Debug, Clone)]
pub struct OutOfBand {
    pub method: Method,
    pub path: ApiPath,
    pub body: Value,
}

/// Per-collection parameters of the generic lifecycle.
pub trait ResourceKind {
    /// Singular name used in messages ("user", "stream").
    const NAME: &'static str;
    /// Field holding the identity used in `{collection}/{id}` URLs.
    const ID_FIELD: &'static str;
    /// Fields that must be present in a create payload.
    const REQUIRED_ON_CREATE: &'static [&'static str];
    /// Key of the entry array in the collection listing.
    const LIST_KEY: &'static str;
    /// Key carrying the new id in a 201 response, if the server sends one.
    const CREATED_ID_KEY: Option<&'static str> = None;
    /// Schema model applied to create payloads.
    const CREATE_MODEL: Option<&'static str> = None;
    /// Schema model applied to update payloads.
    const UPDATE_MODEL: Option<&'static str> = None;
    /// Schema model applied to hydrated JSON (only when already cached).
    const READ_MODEL: Option<&'static str> = None;

    /// Collection path relative to the base URL.
    fn collection(&self) -> Result<ApiPath, Error>;

    fn update_method(&self) -> Method {
        Method::PUT
    }

    /// Route an update field to its own endpoint. Returning `Some` removes
    /// the field from the regular update body and from the change diff.
    fn out_of_band_update(&self, _id: &str, _field: &str, _value: &Value) -> Option<OutOfBand> {
        None
    }
}

/// Resource kinds whose listing entries carry a `title`.
pub trait Titled: ResourceKind {}

/// Client-side representative of one server-side entity.
#[derive(Debug)]
pub struct Resource<K> {
    session: Arc<Session>,
    kind: K,
    state: ResourceState,
    last_response: Option<Value>,
    error_message: String,
}

impl<K: ResourceKind + Default> Resource<K> {
    pub fn new(session: Arc<Session>) -> Self {
        Self::with_kind(session, K::default())
    }

    /// Fetch the collection listing and hydrate one object per entry.
    ///
    /// Fails as a whole if any entry is rejected; no partial list is
    /// returned.
    pub async fn list(session: &Arc<Session>) -> Result<Vec<Self>, Error>
    where
        K: Clone,
    {
        Self::list_in(session, &K::default()).await
    }
}

impl<K: ResourceKind> Resource<K> {
    pub fn with_kind(session: Arc<Session>, kind: K) -> Self {
        Self {
            session,
            kind,
            state: ResourceState::Unloaded,
            last_response: None,
            error_message: String::new(),
        }
    }

    /// [`list`](Self::list) for kinds that carry context (rules).
    pub async fn list_in(session: &Arc<Session>, kind: &K) -> Result<Vec<Self>, Error>
    where
        K: Clone,
    {
        let collection = kind.collection()?;
        let resp = session.get(collection).await?;
        resp.check_success()?;

        let body = resp.body_or_null();
        let entries = listing_entries(&body, K::LIST_KEY).ok_or_else(|| Error::Deserialization {
            message: format!("listing has no '{}' array", K::LIST_KEY),
            body: resp.text.clone(),
        })?;

        let mut result = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut object = Self::with_kind(Arc::clone(session), kind.clone());
            object.load_from_json(entry.clone())?;
            result.push(object);
        }
        debug!(kind = K::NAME, count = result.len(), "listing hydrated");
        Ok(result)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut K {
        &mut self.kind
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    /// The cached server representation, if loaded.
    pub fn data(&self) -> Option<&Document> {
        self.state.data()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data().and_then(|d| d.get(field))
    }

    /// The identity value, if loaded and present.
    pub fn id(&self) -> Option<&str> {
        self.get(K::ID_FIELD).and_then(Value::as_str)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ResourceState::Loaded(_))
    }

    /// Body of the last response that was not a plain success.
    pub fn last_response(&self) -> Option<&Value> {
        self.last_response.as_ref()
    }

    /// Message describing the last failure, empty if none.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    // ── Internal helpers ─────────────────────────────────────────────

    /// Record an error message, then hand the error back for `return Err`.
    pub(crate) fn fail(&mut self, err: Error) -> Error {
        self.error_message = err.to_string();
        err
    }

    /// Keep the server's answer for inspection.
    pub(crate) fn record(&mut self, resp: &ApiResponse) {
        self.last_response = Some(resp.body_or_null());
        self.error_message = resp.message();
    }

    /// Record a business-rule refusal (no request issued).
    pub(crate) fn refuse(&mut self, message: impl Into<String>) -> bool {
        self.error_message = message.into();
        false
    }

    /// Map a non-success response to the error the caller must see,
    /// recording it first.
    pub(crate) fn reject(&mut self, resp: &ApiResponse) -> Error {
        self.record(resp);
        match resp.check_success() {
            Err(err) => self.fail(err),
            Ok(()) => self.fail(Error::validation(format!(
                "unexpected HTTP {}: {}",
                resp.status.as_u16(),
                resp.message()
            ))),
        }
    }

    pub(crate) fn data_mut(&mut self) -> Option<&mut Document> {
        match &mut self.state {
            ResourceState::Loaded(doc) => Some(doc),
            ResourceState::Unloaded | ResourceState::Deleted => None,
        }
    }

    pub(crate) fn collection(&mut self) -> Result<ApiPath, Error> {
        self.kind.collection().map_err(|e| self.fail(e))
    }

    /// Identity of the loaded object, or a validation error.
    pub(crate) fn require_id(&mut self) -> Result<String, Error> {
        match self.id() {
            Some(id) if !id.is_empty() => Ok(id.to_owned()),
            _ => Err(self.fail(Error::validation(format!(
                "the {} object is empty: no {} available",
                K::NAME,
                K::ID_FIELD
            )))),
        }
    }

    fn require_non_empty(&mut self, id: &str) -> Result<(), Error> {
        if id.is_empty() {
            return Err(self.fail(Error::validation(format!(
                "given {} {} is too short",
                K::NAME,
                K::ID_FIELD
            ))));
        }
        Ok(())
    }

    fn into_mapping(&mut self, details: Value) -> Result<Document, Error> {
        match details {
            Value::Object(doc) => Ok(doc),
            _ => Err(self.fail(Error::validation(format!(
                "given {} details must be a mapping",
                K::NAME
            )))),
        }
    }

    async fn validate_schema(
        &mut self,
        model: Option<&'static str>,
        doc: &Document,
    ) -> Result<(), Error> {
        let Some(model) = model else {
            return Ok(());
        };
        if !self.session.validates_schemas() {
            return Ok(());
        }
        let collection = self.collection()?;
        let spec = self
            .session
            .schema_model(collection.root(), model)
            .await
            .map_err(|e| self.fail(e))?;
        schema::validate(model, &spec, doc).map_err(|e| self.fail(e))
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create the entity on the server.
    ///
    /// On 201 the cached data becomes the payload that was sent (plus the
    /// new id when the server returns one). 5xx and 400 are errors; any
    /// other status returns `Ok(false)` with the response retained.
    pub async fn create(&mut self, details: Value) -> Result<bool, Error> {
        let mut doc = self.into_mapping(details)?;

        let missing: Vec<&'static str> = K::REQUIRED_ON_CREATE
            .iter()
            .copied()
            .filter(|field| !doc.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(self.fail(Error::MissingField {
                resource: K::NAME,
                fields: missing,
            }));
        }

        self.validate_schema(K::CREATE_MODEL, &doc).await?;

        let collection = self.collection()?;
        let body = Value::Object(doc.clone());
        let resp = self.session.post(collection, Some(&body)).await?;

        match resp.status {
            StatusCode::CREATED => {
                if let Some(key) = K::CREATED_ID_KEY {
                    if let Some(id) = resp.body.as_ref().and_then(|b| b.get(key)) {
                        doc.insert(K::ID_FIELD.to_owned(), id.clone());
                    }
                }
                debug!(kind = K::NAME, id = ?doc.get(K::ID_FIELD), "created");
                self.state = ResourceState::Loaded(doc);
                self.last_response = resp.body;
                self.error_message.clear();
                Ok(true)
            }
            status if status.is_server_error() || status == StatusCode::BAD_REQUEST => {
                Err(self.reject(&resp))
            }
            _ => {
                self.record(&resp);
                Ok(false)
            }
        }
    }

    /// Tell whether `id` exists on the server without loading it.
    ///
    /// 404 is `Ok(false)`, never an error.
    pub async fn find_by_id(&mut self, id: &str) -> Result<bool, Error> {
        self.require_non_empty(id)?;
        let collection = self.collection()?;
        let resp = self.session.get(collection.segment(id)).await?;

        match resp.class() {
            StatusClass::Success => Ok(true),
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(false)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Load `id` from the server, replacing the cached data.
    pub async fn load_from_server(&mut self, id: &str) -> Result<bool, Error> {
        self.require_non_empty(id)?;
        let collection = self.collection()?;
        let resp = self.session.get(collection.segment(id)).await?;

        match resp.class() {
            StatusClass::Success => {
                let doc = resp.into_document().map_err(|e| self.fail(e))?;
                self.state = ResourceState::Loaded(doc);
                self.error_message.clear();
                Ok(true)
            }
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(false)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Hydrate from JSON obtained elsewhere (a listing, a backup file).
    ///
    /// No network call: the read model is only checked when the schema is
    /// already cached on the session.
    pub fn load_from_json(&mut self, details: Value) -> Result<(), Error> {
        let doc = self.into_mapping(details)?;
        if doc.is_empty() {
            return Err(self.fail(Error::validation(format!(
                "given {} details are empty",
                K::NAME
            ))));
        }

        if let (Some(model), true) = (K::READ_MODEL, self.session.validates_schemas()) {
            let collection = self.collection()?;
            if let Some(spec) = self.session.cached_schema_model(collection.root(), model) {
                schema::validate(model, &spec, &doc).map_err(|e| self.fail(e))?;
            }
        }

        self.state = ResourceState::Loaded(doc);
        Ok(())
    }

    /// Apply `details` to the loaded entity.
    ///
    /// Returns `Ok(true)` when at least one regular field differed from the
    /// cached value (the object is then re-fetched once), `Ok(false)` when
    /// nothing changed. Out-of-band fields are sent first and never count
    /// as a change.
    pub async fn update(&mut self, details: Value) -> Result<bool, Error> {
        let id = self.require_id()?;
        let mut doc = self.into_mapping(details)?;
        doc.remove(K::ID_FIELD);
        if doc.is_empty() {
            return Err(self.fail(Error::validation(format!(
                "nothing to update on {} '{id}'",
                K::NAME
            ))));
        }

        let side: Vec<(String, OutOfBand)> = doc
            .iter()
            .filter_map(|(field, value)| {
                self.kind
                    .out_of_band_update(&id, field, value)
                    .map(|req| (field.clone(), req))
            })
            .collect();
        for (field, _) in &side {
            doc.remove(field);
        }

        self.validate_schema(K::UPDATE_MODEL, &doc).await?;

        for (field, req) in side {
            debug!(kind = K::NAME, %id, %field, "out-of-band update");
            let resp = self
                .session
                .request(req.method, req.path, Some(&req.body))
                .await?;
            if resp.class() != StatusClass::Success {
                return Err(self.reject(&resp));
            }
        }

        if doc.is_empty() {
            return Ok(false);
        }

        let collection = self.collection()?;
        let path = collection.segment(&id);
        let body = Value::Object(doc.clone());
        let resp = self
            .session
            .request(self.kind.update_method(), path.clone(), Some(&body))
            .await?;
        if resp.class() != StatusClass::Success {
            return Err(self.reject(&resp));
        }

        let changed = {
            let cached = self.data();
            doc.iter()
                .any(|(field, value)| cached.and_then(|c| c.get(field)) != Some(value))
        };
        if !changed {
            debug!(kind = K::NAME, %id, "update was a no-op");
            return Ok(false);
        }

        let refreshed = self.session.get(path).await?;
        if refreshed.class() != StatusClass::Success {
            let status = refreshed.status.as_u16();
            warn!(kind = K::NAME, %id, status, "re-fetch after update failed");
            return Err(self.reject(&refreshed));
        }
        let fresh = refreshed.into_document().map_err(|e| self.fail(e))?;
        self.state = ResourceState::Loaded(fresh);
        self.error_message.clear();
        Ok(true)
    }

    /// Delete the loaded entity. On 204 the cached data is cleared.
    pub async fn delete(&mut self) -> Result<bool, Error> {
        let id = self.require_id()?;
        let collection = self.collection()?;
        let resp = self.session.delete(collection.segment(&id)).await?;

        if resp.class() == StatusClass::ServerError {
            return Err(self.reject(&resp));
        }
        if resp.status == StatusCode::NO_CONTENT {
            debug!(kind = K::NAME, %id, "deleted");
            self.state = ResourceState::Deleted;
            self.error_message.clear();
            return Ok(true);
        }
        self.record(&resp);
        Ok(false)
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Raw JSON of one entity, `None` if it does not exist.
    pub async fn backup(&mut self, id: &str) -> Result<Option<Value>, Error> {
        self.require_non_empty(id)?;
        let collection = self.collection()?;
        let resp = self.session.get(collection.segment(id)).await?;
        match resp.class() {
            StatusClass::Success => Ok(Some(resp.body_or_null())),
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(None)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Raw JSON of the whole collection listing.
    pub async fn backup_all(&mut self) -> Result<Value, Error> {
        let collection = self.collection()?;
        let resp = self.session.get(collection).await?;
        if resp.class() != StatusClass::Success {
            return Err(self.reject(&resp));
        }
        Ok(resp.body_or_null())
    }
}

impl<K: Titled> Resource<K> {
    /// Scan the collection listing for an entry titled `title`.
    ///
    /// The API has no server-side filter, so the whole listing is fetched.
    pub async fn find_by_title(&mut self, title: &str) -> Result<Option<String>, Error> {
        if title.is_empty() {
            return Err(self.fail(Error::validation("given title is too short")));
        }
        let collection = self.collection()?;
        let resp = self.session.get(collection).await?;
        match resp.class() {
            StatusClass::Success => {}
            StatusClass::NotFound => {
                self.record(&resp);
                return Ok(None);
            }
            StatusClass::ClientError | StatusClass::ServerError => return Err(self.reject(&resp)),
        }

        let body = resp.body_or_null();
        let found = listing_entries(&body, K::LIST_KEY)
            .into_iter()
            .flatten()
            .find(|entry| entry.get("title").and_then(Value::as_str) == Some(title))
            .and_then(|entry| entry.get(K::ID_FIELD))
            .and_then(Value::as_str)
            .map(String::from);
        Ok(found)
    }
}

/// Entries of a listing: `{ "<key>": [...] }` or a bare array.
pub(crate) fn listing_entries<'a>(body: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    body.get(key)
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
}
