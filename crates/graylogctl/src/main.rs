mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        // Nagios reads clap's exit 2 as CRITICAL
        Err(err) => match commands::nagios::usage(&err, &argv) {
            Some(verdict) => std::process::exit(verdict.report()),
            None => err.exit(),
        },
    };

    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

// Logs go to stderr: stdout belongs to command output and the Nagios line.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run one command, returning the process exit code.
async fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        // Nagios plugins report every failure on stdout with their own codes
        Command::Check(args) => Ok(commands::nagios::check(args, &cli.global).await.report()),
        Command::Control(args) => Ok(commands::nagios::control(args, &cli.global).await.report()),

        Command::Config(args) => commands::config_cmd::handle(args, &cli.global).map(|()| 0),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "graylogctl", &mut std::io::stdout());
            Ok(0)
        }

        cmd => {
            let cfg = graylog_config::load_config()?;
            let session = config::resolve_target(&cli.global, cfg)?.connect()?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, session, &cli.global).await.map(|()| 0)
        }
    }
}
