// Stream endpoints
//
// Beyond the generic lifecycle: title lookup, rule listing, throughput and
// pause/resume gated on the cached `disabled` flag.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::alert_receivers::ReceiverType;
use crate::error::Error;
use crate::resource::{Resource, ResourceKind, Titled, listing_entries};
use crate::session::{ApiPath, Session, StatusClass};

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamKind;

impl ResourceKind for StreamKind {
    const NAME: &'static str = "stream";
    const ID_FIELD: &'static str = "id";
    const REQUIRED_ON_CREATE: &'static [&'static str] = &["description", "title"];
    const LIST_KEY: &'static str = "streams";
    const CREATED_ID_KEY: Option<&'static str> = Some("stream_id");
    const CREATE_MODEL: Option<&'static str> = Some("CreateStreamRequest");

    fn collection(&self) -> Result<ApiPath, Error> {
        Ok(ApiPath::new("streams"))
    }
}

impl Titled for StreamKind {}

/// A Graylog stream.
pub type Stream = Resource<StreamKind>;

impl Resource<StreamKind> {
    /// Whether the cached data marks the stream as paused.
    pub fn is_disabled(&self) -> bool {
        self.get("disabled").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Ids of the rules attached to the loaded stream.
    ///
    /// `GET /streams/{id}/rules`
    pub async fn rules(&mut self) -> Result<Vec<String>, Error> {
        let id = self.require_id()?;
        let path = ApiPath::new("streams").segment(&id).then("rules");
        let resp = self.session().get(path).await?;
        if resp.class() != StatusClass::Success {
            return Err(self.reject(&resp));
        }
        let body = resp.body_or_null();
        Ok(listing_entries(&body, "stream_rules")
            .into_iter()
            .flatten()
            .filter_map(|rule| rule.get("id").and_then(Value::as_str))
            .map(String::from)
            .collect())
    }

    /// Current throughput of the loaded stream on the answering node, in
    /// messages per second.
    ///
    /// `GET /streams/{id}/throughput`
    pub async fn throughput(&mut self) -> Result<f64, Error> {
        let id = self.require_id()?;
        let resp = self
            .session()
            .get(ApiPath::new("streams").segment(&id).then("throughput"))
            .await?;
        if resp.class() != StatusClass::Success {
            return Err(self.reject(&resp));
        }
        resp.body
            .as_ref()
            .and_then(|b| b.get("throughput"))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                self.fail(Error::Deserialization {
                    message: "response has no numeric 'throughput'".into(),
                    body: resp.text.clone(),
                })
            })
    }

    /// Throughput of every stream on the answering node.
    ///
    /// `GET /streams/throughput`; returns the `throughput` object keyed by
    /// stream id.
    pub async fn all_throughput(session: &Arc<Session>) -> Result<Value, Error> {
        let resp = session.get("streams/throughput").await?;
        resp.check_success()?;
        Ok(resp
            .body
            .and_then(|mut b| b.get_mut("throughput").map(Value::take))
            .unwrap_or(Value::Null))
    }

    /// Pause the loaded stream.
    ///
    /// Returns `Ok(false)` without any request if the stream is already
    /// paused.
    pub async fn pause(&mut self) -> Result<bool, Error> {
        let id = self.require_id()?;
        if self.is_disabled() {
            return Ok(self.refuse(format!("stream '{id}' is already paused")));
        }
        self.toggle(&id, "pause", true).await
    }

    /// Resume the loaded stream.
    ///
    /// Returns `Ok(false)` without any request if the stream is already
    /// running.
    pub async fn resume(&mut self) -> Result<bool, Error> {
        let id = self.require_id()?;
        if !self.is_disabled() {
            return Ok(self.refuse(format!("stream '{id}' is already running")));
        }
        self.toggle(&id, "resume", false).await
    }

    async fn toggle(&mut self, id: &str, action: &'static str, disabled: bool) -> Result<bool, Error> {
        debug!(stream = id, action, "toggling stream");
        let resp = self
            .session()
            .post(ApiPath::new("streams").segment(id).then(action), None)
            .await?;
        match resp.class() {
            StatusClass::Success => {
                if let Some(data) = self.data_mut() {
                    data.insert("disabled".into(), json!(disabled));
                }
                Ok(true)
            }
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(false)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Alert receivers of the given type, from the cached data.
    pub fn alert_receivers(&self, receiver_type: ReceiverType) -> Vec<String> {
        self.get("alert_receivers")
            .and_then(|r| r.get(receiver_type.as_ref()))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
