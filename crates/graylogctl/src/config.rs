//! Connection resolution: config profile + global flags → session.
//!
//! Precedence is flag / env var, then profile, then built-in defaults.

use std::sync::Arc;

use secrecy::SecretString;

use graylog_api::Session;
use graylog_config::{Config, Defaults, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to open a session, before any validation.
pub struct Target {
    pub profile_name: String,
    pub profile: Profile,
    pub defaults: Defaults,
    pub credentials: Option<(String, SecretString)>,
}

/// Merge the active profile (if any) with the global flags.
///
/// A profile named explicitly with `--profile` must exist; the implicit
/// default profile may be absent when the flags carry everything.
pub fn resolve_target(global: &GlobalOpts, cfg: Config) -> Result<Target, CliError> {
    let profile_name = global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    apply_flags(&mut profile, global);

    let credentials = match (&profile.username, &global.password) {
        (Some(user), Some(password)) => Some((user.clone(), SecretString::from(password.clone()))),
        _ => graylog_config::resolve_credentials(&profile, &profile_name).ok(),
    };

    Ok(Target {
        profile_name,
        profile,
        defaults: cfg.defaults,
        credentials,
    })
}

/// Overlay the connection flags onto a profile.
pub fn apply_flags(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if global.tls {
        profile.tls = true;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.validate_schemas {
        profile.validate_schemas = true;
    }
    if global.user.is_some() {
        profile.username.clone_from(&global.user);
    }
}

impl Target {
    /// First missing or unusable connection setting, named the way the
    /// Nagios output reports it.
    pub fn problem(&self) -> Option<&'static str> {
        if self.profile.host.trim().is_empty() {
            Some("hostname")
        } else if self.profile.port == Some(0) {
            Some("port")
        } else if self.profile.username.as_deref().is_none_or(str::is_empty) {
            Some("user")
        } else if self.credentials.is_none() {
            Some("password")
        } else {
            None
        }
    }

    /// Build and authenticate the session.
    pub fn connect(self) -> Result<Arc<Session>, CliError> {
        if self.profile.host.trim().is_empty() {
            return Err(CliError::NoConfig {
                path: graylog_config::config_path().display().to_string(),
            });
        }
        let session_config =
            graylog_config::profile_to_session_config(&self.profile, &self.defaults)?;
        let session = Session::from_config(&session_config)?;

        let Some((username, password)) = self.credentials else {
            return Err(CliError::NoCredentials {
                profile: self.profile_name,
            });
        };
        session.authenticate(&username, password)?;
        tracing::debug!(url = %session.base_url(), %username, "session ready");
        Ok(Arc::new(session))
    }
}
