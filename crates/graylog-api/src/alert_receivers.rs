// Alert receivers
//
// Not a server collection: receivers are the `alert_receivers` sub-object of
// each stream (`{"emails": [...], "users": [...]}`). Lookups scan every
// stream; erasing fans out one DELETE per referencing stream, best-effort.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

use crate::error::Error;
use crate::resource::{Document, ResourceState};
use crate::session::{ApiPath, ApiResponse, Session, StatusClass};
use crate::streams::Stream;

/// Fields every receiver item must carry on create.
const REQUIRED_ON_CREATE: &[&str] = &["streamId", "entity", "type"];

/// Kind of alert receiver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReceiverType {
    /// A Graylog username.
    Users,
    /// A plain email address.
    Emails,
}

/// Outcome of [`AlertReceiver::erase`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EraseReport {
    /// Streams the receiver was removed from.
    pub removed: Vec<String>,
    /// Streams that still reference it, with the reason.
    pub failed: Vec<(String, String)>,
}

impl EraseReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A receiver entity (user or email) projected over every stream that
/// references it.
///
/// Loaded data has the shape `{"entity": ..., "type": ..., "streams": [ids]}`.
#[derive(Debug)]
pub struct AlertReceiver {
    session: Arc<Session>,
    state: ResourceState,
    last_response: Option<Value>,
    error_message: String,
}

impl AlertReceiver {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            state: ResourceState::Unloaded,
            last_response: None,
            error_message: String::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn data(&self) -> Option<&Document> {
        self.state.data()
    }

    pub fn entity(&self) -> Option<&str> {
        self.data()
            .and_then(|d| d.get("entity"))
            .and_then(Value::as_str)
    }

    pub fn receiver_type(&self) -> Option<ReceiverType> {
        self.data()
            .and_then(|d| d.get("type"))
            .and_then(Value::as_str)
            .and_then(|t| t.parse().ok())
    }

    /// Ids of the streams referencing the entity, as last loaded.
    pub fn streams(&self) -> Vec<String> {
        self.data()
            .and_then(|d| d.get("streams"))
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn last_response(&self) -> Option<&Value> {
        self.last_response.as_ref()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    fn fail(&mut self, err: Error) -> Error {
        self.error_message = err.to_string();
        err
    }

    fn record(&mut self, resp: &ApiResponse) {
        self.last_response = Some(resp.body_or_null());
        self.error_message = resp.message();
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Subscribe receivers to streams.
    ///
    /// `details` is one mapping or a list of mappings, each with `streamId`,
    /// `entity` and `type`. Every item is checked before the first request.
    /// On success the object holds the first item's entity, projected over
    /// the streams the call subscribed it to.
    pub async fn create(&mut self, details: Value) -> Result<bool, Error> {
        let items = match details {
            Value::Object(item) => vec![item],
            Value::Array(list) if !list.is_empty() => {
                let mut items = Vec::with_capacity(list.len());
                for entry in list {
                    match entry {
                        Value::Object(item) => items.push(item),
                        _ => {
                            return Err(self.fail(Error::validation(
                                "every alert receiver item must be a mapping",
                            )));
                        }
                    }
                }
                items
            }
            _ => {
                return Err(self.fail(Error::validation(
                    "given alert receiver details must be a mapping or a non-empty list",
                )));
            }
        };

        let mut parsed = Vec::with_capacity(items.len());
        for item in &items {
            parsed.push(self.parse_item(item)?);
        }

        for (stream_id, entity, receiver_type) in &parsed {
            debug!(stream = %stream_id, %entity, %receiver_type, "adding alert receiver");
            let resp = self
                .session
                .request_with_query(
                    reqwest::Method::POST,
                    ApiPath::new("streams")
                        .segment(stream_id)
                        .then("alerts/receivers"),
                    &[("entity", entity.as_str()), ("type", receiver_type.as_ref())],
                    None,
                )
                .await?;
            if resp.class() == StatusClass::Success {
                continue;
            }
            self.record(&resp);
            if resp.class() == StatusClass::ServerError
                || resp.status == reqwest::StatusCode::BAD_REQUEST
            {
                if let Err(err) = resp.check_success() {
                    return Err(self.fail(err));
                }
            }
            return Ok(false);
        }

        let Some((_, entity, receiver_type)) = parsed.first() else {
            return Ok(false);
        };
        let streams: Vec<&str> = parsed
            .iter()
            .filter(|(_, e, t)| e == entity && t == receiver_type)
            .map(|(s, _, _)| s.as_str())
            .collect();
        self.state = ResourceState::Loaded(projection(entity, *receiver_type, &streams));
        self.error_message.clear();
        Ok(true)
    }

    fn parse_item(&mut self, item: &Document) -> Result<(String, String, ReceiverType), Error> {
        let missing: Vec<&'static str> = REQUIRED_ON_CREATE
            .iter()
            .copied()
            .filter(|field| !item.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(self.fail(Error::MissingField {
                resource: "alert receiver",
                fields: missing,
            }));
        }

        let text = |field: &str| {
            item.get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let (Some(stream_id), Some(entity), Some(kind)) =
            (text("streamId"), text("entity"), text("type"))
        else {
            return Err(self.fail(Error::validation(
                "streamId, entity and type must be non-empty strings",
            )));
        };
        let receiver_type = kind.parse::<ReceiverType>().map_err(|_| {
            self.fail(Error::validation(format!(
                "unknown alert receiver type '{kind}', expected 'users' or 'emails'"
            )))
        })?;
        Ok((stream_id, entity, receiver_type))
    }

    /// Whether any stream references `entity`.
    pub async fn find_by_id(&mut self, entity: &str) -> Result<bool, Error> {
        Ok(self.scan(entity).await?.is_some())
    }

    /// Load the projection of `entity` over every stream.
    pub async fn load_from_server(&mut self, entity: &str) -> Result<bool, Error> {
        match self.scan(entity).await? {
            Some((receiver_type, streams)) => {
                let ids: Vec<&str> = streams.iter().map(String::as_str).collect();
                self.state = ResourceState::Loaded(projection(entity, receiver_type, &ids));
                self.error_message.clear();
                Ok(true)
            }
            None => {
                self.error_message = format!("alert receiver '{entity}' not found");
                Ok(false)
            }
        }
    }

    /// Remove the loaded entity from every stream referencing it.
    ///
    /// Streams are re-scanned first so only current references are touched.
    /// There is no rollback: a failure on one stream is recorded in the
    /// report and the remaining streams are still processed. The object is
    /// marked deleted only when every removal succeeded.
    pub async fn erase(&mut self) -> Result<EraseReport, Error> {
        let (Some(entity), Some(receiver_type)) =
            (self.entity().map(String::from), self.receiver_type())
        else {
            return Err(self.fail(Error::validation(
                "the alert receiver object is empty: no entity available",
            )));
        };

        let streams = Stream::list(&self.session).await.map_err(|e| self.fail(e))?;
        let mut report = EraseReport::default();

        for stream in &streams {
            let Some(stream_id) = stream.id() else {
                continue;
            };
            if !stream.alert_receivers(receiver_type).contains(&entity) {
                continue;
            }

            debug!(stream = stream_id, %entity, "removing alert receiver");
            let outcome = self
                .session
                .request_with_query(
                    reqwest::Method::DELETE,
                    ApiPath::new("streams")
                        .segment(stream_id)
                        .then("alerts/receivers"),
                    &[("entity", entity.as_str()), ("type", receiver_type.as_ref())],
                    None,
                )
                .await;
            match outcome {
                Ok(resp) if resp.class() == StatusClass::Success => {
                    report.removed.push(stream_id.to_owned());
                }
                Ok(resp) => {
                    let status = resp.status.as_u16();
                    warn!(stream = stream_id, status, "alert receiver removal failed");
                    self.record(&resp);
                    report.failed.push((
                        stream_id.to_owned(),
                        format!("HTTP {status}: {}", resp.message()),
                    ));
                }
                Err(err) => {
                    warn!(stream = stream_id, error = %err, "alert receiver removal failed");
                    report.failed.push((stream_id.to_owned(), err.to_string()));
                }
            }
        }

        if report.is_complete() {
            self.state = ResourceState::Deleted;
            self.error_message.clear();
        } else {
            self.error_message = format!(
                "alert receiver '{entity}' still referenced by {} stream(s)",
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Find the type under which `entity` is referenced, and by which
    /// streams. `users` references win over `emails` if both exist.
    async fn scan(&mut self, entity: &str) -> Result<Option<(ReceiverType, Vec<String>)>, Error> {
        if entity.is_empty() {
            return Err(self.fail(Error::validation("given entity is too short")));
        }
        let streams = Stream::list(&self.session).await.map_err(|e| self.fail(e))?;

        for receiver_type in [ReceiverType::Users, ReceiverType::Emails] {
            let ids: Vec<String> = streams
                .iter()
                .filter(|s| s.alert_receivers(receiver_type).iter().any(|e| e == entity))
                .filter_map(|s| s.id().map(String::from))
                .collect();
            if !ids.is_empty() {
                return Ok(Some((receiver_type, ids)));
            }
        }
        Ok(None)
    }
}

fn projection(entity: &str, receiver_type: ReceiverType, streams: &[&str]) -> Document {
    let mut doc = Document::new();
    doc.insert("entity".into(), json!(entity));
    doc.insert("type".into(), json!(receiver_type));
    doc.insert("streams".into(), json!(streams));
    doc
}
