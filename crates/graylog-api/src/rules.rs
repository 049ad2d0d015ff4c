// Stream rule endpoints
//
// Rules live under their stream: `/streams/{stream_id}/rules[/{id}]`. A
// rule only remembers its stream's id; dropping the rule leaves the stream
// alone.

use tracing::debug;

use crate::error::Error;
use crate::resource::{Resource, ResourceKind};
use crate::session::ApiPath;
use crate::streams::Stream;

#[derive(Debug, Clone, Default)]
pub struct RuleKind {
    stream_id: Option<String>,
}

impl RuleKind {
    pub fn for_stream(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: Some(stream_id.into()),
        }
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }
}

impl ResourceKind for RuleKind {
    const NAME: &'static str = "rule";
    const ID_FIELD: &'static str = "id";
    const REQUIRED_ON_CREATE: &'static [&'static str] = &["field", "type", "value"];
    const LIST_KEY: &'static str = "stream_rules";
    const CREATED_ID_KEY: Option<&'static str> = Some("streamrule_id");

    fn collection(&self) -> Result<ApiPath, Error> {
        match self.stream_id.as_deref() {
            Some(stream_id) => Ok(ApiPath::new("streams").segment(stream_id).then("rules")),
            None => Err(Error::configuration(
                "rule is not attached to a stream: call attach() first",
            )),
        }
    }

    // Stream rules are updated with POST on the rule URL.
    fn update_method(&self) -> reqwest::Method {
        reqwest::Method::POST
    }
}

/// A rule matching messages into a stream.
pub type Rule = Resource<RuleKind>;

impl Resource<RuleKind> {
    /// Attach to a loaded stream. Every other operation requires this.
    pub fn attach(&mut self, stream: &Stream) -> Result<(), Error> {
        let Some(stream_id) = stream.id().map(String::from) else {
            return Err(self.fail(Error::configuration(
                "cannot attach a rule to a stream without an id",
            )));
        };
        self.attach_to(stream_id)
    }

    /// Attach by stream id.
    pub fn attach_to(&mut self, stream_id: impl Into<String>) -> Result<(), Error> {
        let stream_id = stream_id.into();
        if stream_id.is_empty() {
            return Err(self.fail(Error::validation("given stream id is too short")));
        }
        debug!(stream = %stream_id, "attaching rule");
        self.kind_mut().stream_id = Some(stream_id);
        Ok(())
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.kind().stream_id()
    }
}
