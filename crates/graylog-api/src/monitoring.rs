// Health checks
//
// One GET per check; the listing is scanned for entries in a bad state and
// their names are reported. Results map onto Nagios plugin exit codes.

use serde_json::Value;
use strum::Display;
use tracing::debug;

use crate::error::Error;
use crate::resource::listing_entries;
use crate::session::Session;

/// Nagios plugin status. The discriminant is the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum NagiosStatus {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl NagiosStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// `"{STATUS} - {message}"`, the first line Nagios parses.
    pub fn line(self, message: impl std::fmt::Display) -> String {
        format!("{self} - {message}")
    }
}

/// A health check over one listing endpoint.
pub trait Check {
    /// Endpoint queried, relative to the base URL.
    const PATH: &'static str;

    /// Names of the entries in a bad state.
    fn failing(&self, body: &Value) -> Result<Vec<String>, Error>;
}

/// Inputs whose `state` is anything but `RUNNING`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputCheck;

impl Check for InputCheck {
    const PATH: &'static str = "system/inputs";

    fn failing(&self, body: &Value) -> Result<Vec<String>, Error> {
        let inputs = entries(body, "inputs")?;
        Ok(inputs
            .iter()
            .filter(|input| input.get("state").and_then(Value::as_str) != Some("RUNNING"))
            .map(|input| {
                input
                    .pointer("/message_input/title")
                    .and_then(Value::as_str)
                    .or_else(|| input.get("id").and_then(Value::as_str))
                    .unwrap_or("<unnamed input>")
                    .to_owned()
            })
            .collect())
    }
}

/// Streams that are not explicitly enabled (`disabled != false`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCheck;

impl Check for StreamCheck {
    const PATH: &'static str = "streams";

    fn failing(&self, body: &Value) -> Result<Vec<String>, Error> {
        let streams = entries(body, "streams")?;
        Ok(streams
            .iter()
            .filter(|stream| stream.get("disabled") != Some(&Value::Bool(false)))
            .map(|stream| {
                stream
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or("<untitled stream>")
                    .to_owned()
            })
            .collect())
    }
}

fn entries<'a>(body: &'a Value, key: &str) -> Result<&'a Vec<Value>, Error> {
    listing_entries(body, key).ok_or_else(|| Error::Deserialization {
        message: format!("response has no '{key}' array"),
        body: body.to_string(),
    })
}

/// Outcome of [`run_check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub failed: Vec<String>,
}

impl CheckReport {
    pub fn status(&self) -> NagiosStatus {
        if self.failed.is_empty() {
            NagiosStatus::Ok
        } else {
            NagiosStatus::Critical
        }
    }

    /// Failed names joined with `", "`; empty when nothing failed.
    pub fn summary(&self) -> String {
        self.failed.join(", ")
    }
}

/// Run one check against the server.
///
/// Any non-success status is an error: a check that cannot see the listing
/// has no verdict to give.
pub async fn run_check<C: Check>(session: &Session, check: &C) -> Result<CheckReport, Error> {
    let resp = session.get(C::PATH).await?;
    resp.check_success()?;
    let failed = check.failing(&resp.body_or_null())?;
    debug!(path = C::PATH, failed = failed.len(), "check finished");
    Ok(CheckReport { failed })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn input_check_reports_stopped_inputs() {
        let body = json!({
            "inputs": [
                { "id": "a", "state": "RUNNING", "message_input": { "title": "syslog" } },
                { "id": "b", "state": "FAILED", "message_input": { "title": "gelf-udp" } },
                { "id": "c", "state": "STOPPED", "message_input": { "title": "beats" } }
            ],
            "total": 3
        });
        assert_eq!(InputCheck.failing(&body).unwrap(), vec!["gelf-udp", "beats"]);
    }

    #[test]
    fn stream_check_treats_missing_flag_as_disabled() {
        let body = json!({
            "streams": [
                { "title": "all", "disabled": false },
                { "title": "paused", "disabled": true },
                { "title": "odd" }
            ]
        });
        assert_eq!(StreamCheck.failing(&body).unwrap(), vec!["paused", "odd"]);
    }

    #[test]
    fn malformed_listing_is_an_error() {
        let err = InputCheck.failing(&json!({ "total": 0 })).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn report_maps_to_nagios() {
        let ok = CheckReport::default();
        assert_eq!(ok.status(), NagiosStatus::Ok);
        assert_eq!(ok.status().code(), 0);

        let bad = CheckReport {
            failed: vec!["a".into(), "b".into()],
        };
        assert_eq!(bad.status().code(), 2);
        assert_eq!(bad.status().line(bad.summary()), "CRITICAL - a, b");
        assert_eq!(NagiosStatus::Unknown.line("bad host given"), "UNKNOWN - bad host given");
    }
}
