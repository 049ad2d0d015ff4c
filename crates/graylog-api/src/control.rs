// Remote control of inputs and streams
//
// `POST /system/inputs/{id}/{launch|stop|restart}` and
// `POST /streams/{id}/{clone|pause|resume}`. Keywords are parsed up front so
// a typo never reaches the server.

use std::str::FromStr;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString, VariantNames};
use tracing::{debug, warn};

use crate::error::Error;
use crate::session::{ApiPath, Session, StatusClass};

/// A control keyword bound to the collection it applies to.
pub trait Command: AsRef<str> + Copy {
    const COLLECTION: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum InputCommand {
    Launch,
    Stop,
    Restart,
}

impl Command for InputCommand {
    const COLLECTION: &'static str = "system/inputs";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum StreamCommand {
    Clone,
    Pause,
    Resume,
}

impl Command for StreamCommand {
    const COLLECTION: &'static str = "streams";
}

/// Parse a control keyword, listing the allowed ones on failure.
pub fn parse_command<C>(keyword: &str) -> Result<C, Error>
where
    C: FromStr + VariantNames,
{
    keyword.parse().map_err(|_| {
        Error::validation(format!(
            "bad keyword '{keyword}', should be one of: {}",
            C::VARIANTS.join(", ")
        ))
    })
}

/// Outcome of [`perform`]: the server's complaints, empty on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlOutcome {
    pub failed: Vec<String>,
}

impl ControlOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        self.failed.join(", ")
    }
}

/// Send `command` to the entity `id`.
///
/// 5xx is fatal. Any other status above 299 is a refusal: its `message`
/// (a string or a list of strings) is returned in the outcome.
pub async fn perform<C: Command>(
    session: &Session,
    id: &str,
    command: C,
) -> Result<ControlOutcome, Error> {
    if id.is_empty() {
        return Err(Error::validation("given id is too short"));
    }
    let path = ApiPath::new(C::COLLECTION)
        .segment(id)
        .segment(command.as_ref());
    debug!(%path, "sending control command");

    let resp = session.post(path.clone(), None).await?;
    resp.check_fatal()?;
    if resp.class() == StatusClass::Success {
        return Ok(ControlOutcome::default());
    }

    warn!(status = resp.status.as_u16(), %path, "control command refused");
    let failed = match resp.body.as_ref().and_then(|b| b.get("message")) {
        Some(Value::String(message)) => vec![message.clone()],
        Some(Value::Array(messages)) => messages
            .iter()
            .map(|m| m.as_str().map_or_else(|| m.to_string(), String::from))
            .collect(),
        _ => vec![resp.message()],
    };
    Ok(ControlOutcome { failed })
}
