//! User command handlers.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use graylog_api::Session;
use graylog_api::users::UserKind;

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Full name")]
    full_name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Permissions")]
    permissions: String,
}

fn row(doc: &Value) -> UserRow {
    UserRow {
        username: util::field(doc, "username"),
        full_name: util::field(doc, "full_name"),
        email: util::field(doc, "email"),
        permissions: doc
            .get("permissions")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
            .to_string(),
    }
}

fn detail(doc: &Value) -> String {
    util::detail(
        doc,
        &[
            ("Username", "username"),
            ("Full name", "full_name"),
            ("Email", "email"),
            ("Read only", "read_only"),
            ("Timezone", "timezone"),
            ("Permissions", "permissions"),
        ],
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: Arc<Session>,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List => {
            let users = session.list_users().await?;
            let docs = util::documents(&users);
            let out = output::render_list(&global.output, &docs, row, |d| {
                util::field(d, "username")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Get { username } => {
            let user = util::load::<UserKind>(session, &username, "user", "users list").await?;
            let doc = user.data().cloned().map(Value::Object).unwrap_or_default();
            let out = output::render_single(&global.output, &doc, detail, |d| {
                util::field(d, "username")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Delete { username } => {
            let mut user =
                util::load::<UserKind>(session, &username, "user", "users list").await?;
            if !user.delete().await? {
                return Err(util::refused(&user, "delete was refused"));
            }
            if !global.quiet {
                eprintln!("User '{username}' deleted");
            }
            Ok(())
        }
    }
}
