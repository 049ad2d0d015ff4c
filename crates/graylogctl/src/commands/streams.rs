//! Stream command handlers.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use graylog_api::streams::StreamKind;
use graylog_api::{Session, Stream};

use crate::cli::{GlobalOpts, StreamsArgs, StreamsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct StreamRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Rules")]
    rules: String,
}

fn row(doc: &Value) -> StreamRow {
    let paused = doc.get("disabled").and_then(Value::as_bool).unwrap_or(false);
    StreamRow {
        id: util::field(doc, "id"),
        title: util::field(doc, "title"),
        state: if paused { "paused" } else { "running" }.into(),
        rules: doc
            .get("rules")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
            .to_string(),
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Rule ID")]
    id: String,
}

fn detail(doc: &Value) -> String {
    util::detail(
        doc,
        &[
            ("ID", "id"),
            ("Title", "title"),
            ("Description", "description"),
            ("Disabled", "disabled"),
            ("Matching", "matching_type"),
            ("Created", "created_at"),
            ("Creator", "creator_user_id"),
        ],
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: Arc<Session>,
    args: StreamsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        StreamsCommand::List => {
            let streams = Stream::list(&session).await?;
            let docs = util::documents(&streams);
            let out = output::render_list(&global.output, &docs, row, |d| {
                util::field(d, "id")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StreamsCommand::Get { id } => {
            let stream = util::load::<StreamKind>(session, &id, "stream", "streams list").await?;
            let doc = stream.data().cloned().map(Value::Object).unwrap_or_default();
            let out =
                output::render_single(&global.output, &doc, detail, |d| util::field(d, "id"));
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StreamsCommand::Find { title } => {
            let mut stream = Stream::new(session);
            match stream.find_by_title(&title).await? {
                Some(id) => {
                    output::print_output(&id, global.quiet);
                    Ok(())
                }
                None => Err(CliError::NotFound {
                    resource_type: "stream".into(),
                    identifier: title,
                    list_command: "streams list".into(),
                }),
            }
        }

        StreamsCommand::Pause { id } => {
            let mut stream =
                util::load::<StreamKind>(session, &id, "stream", "streams list").await?;
            if !stream.pause().await? {
                return Err(util::refused(&stream, "pause was refused"));
            }
            if !global.quiet {
                eprintln!("Stream '{id}' paused");
            }
            Ok(())
        }

        StreamsCommand::Resume { id } => {
            let mut stream =
                util::load::<StreamKind>(session, &id, "stream", "streams list").await?;
            if !stream.resume().await? {
                return Err(util::refused(&stream, "resume was refused"));
            }
            if !global.quiet {
                eprintln!("Stream '{id}' resumed");
            }
            Ok(())
        }

        StreamsCommand::Rules { id } => {
            let mut stream =
                util::load::<StreamKind>(session, &id, "stream", "streams list").await?;
            let rules = stream.rules().await?;
            let out = output::render_list(
                &global.output,
                &rules,
                |r| RuleRow { id: r.clone() },
                Clone::clone,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
