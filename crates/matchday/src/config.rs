//! CLI flag overrides on top of `matchday-config` profiles.

use std::time::Duration;

use matchday_config::{self as cfg, Config, ConfigError};
use matchday_core::{LiveConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Name of the profile the CLI will use.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build a `LiveConfig` from the config file, profile, and CLI overrides.
pub fn build_live_config(global: &GlobalOpts) -> Result<LiveConfig, CliError> {
    let config = cfg::load_config()?;

    let mut live = match config.profile(global.profile.as_deref()) {
        Ok((_, profile)) => {
            let mut live = cfg::profile_to_live_config(profile, &config.defaults)?;
            if let Some(ref url) = global.api_url {
                live.api_url = parse_api_url(url)?;
            }
            live
        }
        // An explicitly named profile must exist.
        Err(ConfigError::UnknownProfile { profile }) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile,
                available: available_profiles(&config),
            });
        }
        Err(ConfigError::UnknownProfile { .. }) => {
            let url = global.api_url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: cfg::config_path().display().to_string(),
            })?;
            let mut live = LiveConfig::new(parse_api_url(url)?);
            live.timeout = Duration::from_secs(config.defaults.timeout);
            live.commentary_poll_interval =
                Duration::from_secs(config.defaults.commentary_interval.max(1));
            live
        }
        Err(other) => return Err(other.into()),
    };

    if global.insecure {
        live.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        live.timeout = Duration::from_secs(secs);
    }
    if global.no_push {
        live.push_enabled = false;
    }
    Ok(live)
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

fn parse_api_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
