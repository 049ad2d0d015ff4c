//! Command dispatch: bridges CLI args -> resource objects -> output.

pub mod backup;
pub mod config_cmd;
pub mod dashboards;
pub mod nagios;
pub mod streams;
pub mod users;
pub mod util;

use std::sync::Arc;

use graylog_api::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    session: Arc<Session>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Users(args) => users::handle(session, args, global).await,
        Command::Streams(args) => streams::handle(session, args, global).await,
        Command::Dashboards(args) => dashboards::handle(session, args, global).await,
        Command::Backup(args) => backup::handle(session, args, global).await,
        // Handled before a session is opened
        Command::Check(_) | Command::Control(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    }
}
