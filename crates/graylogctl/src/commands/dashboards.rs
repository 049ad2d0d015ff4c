//! Dashboard command handlers.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use graylog_api::dashboards::DashboardKind;
use graylog_api::{Dashboard, Session};

use crate::cli::{DashboardsArgs, DashboardsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DashboardRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Widgets")]
    widgets: String,
}

fn row(doc: &Value) -> DashboardRow {
    DashboardRow {
        id: util::field(doc, "id"),
        title: util::field(doc, "title"),
        description: util::field(doc, "description"),
        widgets: doc
            .get("widgets")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
            .to_string(),
    }
}

pub async fn handle(
    session: Arc<Session>,
    args: DashboardsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DashboardsCommand::List => {
            let dashboards = Dashboard::list(&session).await?;
            let docs = util::documents(&dashboards);
            let out = output::render_list(&global.output, &docs, row, |d| {
                util::field(d, "id")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DashboardsCommand::Get { id } => {
            let dashboard =
                util::load::<DashboardKind>(session, &id, "dashboard", "dashboards list").await?;
            let doc = dashboard.data().cloned().map(Value::Object).unwrap_or_default();
            let out = output::render_single(
                &global.output,
                &doc,
                |d| {
                    util::detail(
                        d,
                        &[
                            ("ID", "id"),
                            ("Title", "title"),
                            ("Description", "description"),
                            ("Created", "created_at"),
                            ("Creator", "creator_user_id"),
                        ],
                    )
                },
                |d| util::field(d, "id"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
