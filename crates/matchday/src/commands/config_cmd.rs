//! Config subcommand handlers.

use matchday_config::{self as cfg, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::commands::printer;
use crate::config;
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let printer = printer(global);
    match &args.command {
        ConfigCommand::Path => {
            printer.print(&cfg::config_path().display().to_string());
            Ok(())
        }

        ConfigCommand::Show => {
            let loaded = cfg::load_config()?;
            let rendered = match printer.format {
                OutputFormat::Text => toml::to_string_pretty(&loaded).map_err(|e| CliError::Validation {
                    field: "config".into(),
                    reason: format!("failed to serialize config: {e}"),
                })?,
                OutputFormat::Json => serde_json::to_string_pretty(&loaded)?,
                OutputFormat::JsonCompact => serde_json::to_string(&loaded)?,
            };
            printer.print(&rendered);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let loaded = cfg::load_config()?;
            if loaded.profiles.is_empty() {
                printer.print("No profiles configured. Run: matchday config set api_url <URL>");
                return Ok(());
            }
            let active = config::active_profile_name(global, &loaded);
            let lines: Vec<String> = loaded
                .profiles
                .iter()
                .map(|(name, profile)| {
                    let marker = if *name == active { "*" } else { " " };
                    format!("{marker} {name:<16} {}", profile.api_url)
                })
                .collect();
            printer.print(&lines.join("\n"));
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut loaded = cfg::load_config()?;
            let name = config::active_profile_name(global, &loaded);
            let profile = loaded.profiles.entry(name.clone()).or_default();
            set_key(profile, key, value)?;
            // Refuse to save a profile the service could not start from.
            cfg::profile_to_live_config(profile, &loaded.defaults)?;

            cfg::save_config(&loaded)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut loaded = cfg::load_config()?;
            if !loaded.profiles.contains_key(name) {
                return Err(CliError::ProfileNotFound {
                    name: name.clone(),
                    available: config::available_profiles(&loaded),
                });
            }
            loaded.default_profile = Some(name.clone());
            cfg::save_config(&loaded)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

fn set_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "api_url" => profile.api_url = value.to_owned(),
        "live_url" => profile.live_url = Some(value.to_owned()),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "push" => profile.push = Some(parse_value(key, value, "'true' or 'false'")?),
        "upgrade" => profile.upgrade = Some(parse_value(key, value, "'true' or 'false'")?),
        "insecure" => profile.insecure = Some(parse_value(key, value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, value, "a number (seconds)")?),
        "reconnect_attempts" => {
            profile.reconnect_attempts = Some(parse_value(key, value, "a whole number")?);
        }
        "reconnect_max_delay" => {
            profile.reconnect_max_delay = Some(parse_value(key, value, "a number (seconds)")?);
        }
        "commentary_interval" => {
            profile.commentary_interval = Some(parse_value(key, value, "a number (seconds)")?);
        }
        "snapshot_interval" => {
            profile.snapshot_interval = Some(parse_value(key, value, "a number (seconds)")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, live_url, push, upgrade, \
                     ca_cert, insecure, timeout, reconnect_attempts, reconnect_max_delay, \
                     commentary_interval, snapshot_interval"
                ),
            });
        }
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}
