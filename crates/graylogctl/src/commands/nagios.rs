//! Nagios plugin commands.
//!
//! Output is exactly one `STATUS - message` line on stdout; the exit code
//! is the Nagios status. Nothing here returns a `CliError`.

use std::sync::Arc;

use graylog_api::{
    InputCheck, InputCommand, NagiosStatus, Session, StreamCheck, StreamCommand, parse_command,
    perform, run_check,
};

use crate::cli::{CheckArgs, CheckTarget, ControlArgs, ControlTarget, GlobalOpts};
use crate::config;

pub struct Verdict {
    pub status: NagiosStatus,
    pub message: String,
}

impl Verdict {
    fn new(status: NagiosStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unknown(message: impl Into<String>) -> Self {
        Self::new(NagiosStatus::Unknown, message)
    }

    /// Print the status line and return the exit code.
    pub fn report(&self) -> i32 {
        println!("{}", self.status.line(&self.message));
        self.status.code()
    }
}

/// UNKNOWN verdict for a command line that failed to parse.
///
/// `None` when the failure is help or version output, or when `argv` names
/// neither `check` nor `control`: those keep clap's own exit.
pub fn usage(err: &clap::Error, argv: &[String]) -> Option<Verdict> {
    use clap::error::ErrorKind;

    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return None;
    }
    if !argv.iter().skip(1).any(|a| a == "check" || a == "control") {
        return None;
    }
    let text = err.to_string();
    let first = text.lines().next().unwrap_or_default();
    let message = first.strip_prefix("error: ").unwrap_or(first).trim();
    Some(Verdict::unknown(message))
}

/// Validate the connection settings and open an authenticated session.
fn open(global: &GlobalOpts) -> Result<Arc<Session>, Verdict> {
    let cfg = graylog_config::load_config_or_default();
    let target =
        config::resolve_target(global, cfg).map_err(|e| Verdict::unknown(e.to_string()))?;
    if let Some(what) = target.problem() {
        return Err(Verdict::unknown(format!("bad {what} given")));
    }
    target.connect().map_err(|e| Verdict::unknown(e.to_string()))
}

pub async fn check(args: CheckArgs, global: &GlobalOpts) -> Verdict {
    let session = match open(global) {
        Ok(session) => session,
        Err(verdict) => return verdict,
    };

    let (result, healthy) = match args.target {
        CheckTarget::Inputs => (run_check(&session, &InputCheck).await, "all inputs running"),
        CheckTarget::Streams => (
            run_check(&session, &StreamCheck).await,
            "all streams enabled",
        ),
    };

    match result {
        Ok(report) if report.failed.is_empty() => Verdict::new(NagiosStatus::Ok, healthy),
        Ok(report) => Verdict::new(report.status(), report.summary()),
        Err(err) => Verdict::unknown(format!("failed to retrieve data: {err}")),
    }
}

pub async fn control(args: ControlArgs, global: &GlobalOpts) -> Verdict {
    let session = match open(global) {
        Ok(session) => session,
        Err(verdict) => return verdict,
    };
    if args.command.is_empty() {
        return Verdict::unknown("bad command given");
    }
    if args.id.is_empty() {
        return Verdict::unknown("bad id given");
    }

    let (kind, result) = match args.target {
        ControlTarget::Input => match parse_command::<InputCommand>(&args.command) {
            Ok(command) => ("input", perform(&session, &args.id, command).await),
            Err(err) => return Verdict::unknown(err.to_string()),
        },
        ControlTarget::Stream => match parse_command::<StreamCommand>(&args.command) {
            Ok(command) => ("stream", perform(&session, &args.id, command).await),
            Err(err) => return Verdict::unknown(err.to_string()),
        },
    };

    match result {
        Ok(outcome) if outcome.succeeded() => Verdict::new(
            NagiosStatus::Ok,
            format!("action {} on {kind} {} succeeded", args.command, args.id),
        ),
        Ok(outcome) => Verdict::new(NagiosStatus::Critical, outcome.summary()),
        Err(err) => Verdict::unknown(format!(
            "failed to '{}' the {kind}: {err}",
            args.command
        )),
    }
}
