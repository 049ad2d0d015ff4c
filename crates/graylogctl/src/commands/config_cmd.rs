//! `config` subcommands. These never contact the server.

use serde::Serialize;
use tabled::Tabled;

use graylog_api::DEFAULT_PORT;
use graylog_config::Profile;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Clone, Serialize, Tabled)]
struct ProfileView {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "TLS")]
    tls: bool,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Default")]
    default: bool,
}

impl ProfileView {
    fn new(name: &str, profile: &Profile, default: bool) -> Self {
        Self {
            name: name.into(),
            host: profile.host.clone(),
            port: profile.port.unwrap_or(DEFAULT_PORT),
            tls: profile.tls,
            username: profile.username.clone().unwrap_or_else(|| "-".into()),
            default,
        }
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", graylog_config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = graylog_config::load_config()?;
            let mut views: Vec<ProfileView> = cfg
                .profiles
                .iter()
                .map(|(name, profile)| {
                    let default = cfg.default_profile.as_deref() == Some(name.as_str());
                    ProfileView::new(name, profile, default)
                })
                .collect();
            views.sort_by(|a, b| a.name.cmp(&b.name));

            let out =
                output::render_list(&global.output, &views, Clone::clone, |v| v.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetProfile { name, default } => {
            let mut cfg = graylog_config::load_config()?;
            let mut profile = cfg.profiles.get(&name).cloned().unwrap_or_default();
            config::apply_flags(&mut profile, global);

            if profile.host.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "a profile needs --host".into(),
                });
            }

            if let Some(ref password) = global.password {
                graylog_config::store_password(&name, password)?;
                profile.password = None;
            }

            cfg.profiles.insert(name.clone(), profile);
            if default {
                cfg.default_profile = Some(name.clone());
            }
            graylog_config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "Profile '{name}' saved to {}",
                    graylog_config::config_path().display()
                );
            }
            Ok(())
        }
    }
}
