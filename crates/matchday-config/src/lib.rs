//! Shared configuration for matchday tools.
//!
//! TOML profiles merged with `MATCHDAY_` environment overrides, and
//! translation to `matchday_core::LiveConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use matchday_core::{LiveConfig, ReconnectConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Commentary refresh period in seconds.
    #[serde(default = "default_commentary_interval")]
    pub commentary_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            color: default_color(),
            timeout: default_timeout(),
            commentary_interval: default_commentary_interval(),
        }
    }
}

fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_commentary_interval() -> u64 {
    10
}

/// A named match data service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL (e.g., "https://scores.example.com/api").
    pub api_url: String,

    /// Push namespace override. Defaults to `{api_url}/live/`.
    pub live_url: Option<String>,

    /// Set to `false` to run poll-only.
    pub push: Option<bool>,

    /// Set to `false` to stay on long-polling.
    pub upgrade: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification (local development servers only).
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Reconnect attempts before the channel reports degraded.
    pub reconnect_attempts: Option<u32>,

    /// Maximum reconnect delay in seconds.
    pub reconnect_max_delay: Option<u64>,

    /// Override commentary refresh period.
    pub commentary_interval: Option<u64>,

    /// REST snapshot refresh period while push is down, in seconds.
    pub snapshot_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("live", "matchday", "matchday").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("matchday");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults; a
/// file that exists but does not parse is an error.
///
/// Environment keys nest on a double underscore, e.g.
/// `MATCHDAY_PROFILES__DEFAULT__API_URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MATCHDAY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// The profile name in effect: `name`, else `default_profile`, else
    /// `"default"`.
    pub fn profile_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.or(self.default_profile.as_deref()).unwrap_or("default")
    }

    /// Pick a profile by name, falling back to `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = self.profile_name(name);
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

/// Build a `LiveConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_live_config(profile: &Profile, defaults: &Defaults) -> Result<LiveConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let live_url = profile
        .live_url
        .as_deref()
        .map(|raw| parse_url("live_url", raw))
        .transpose()?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut reconnect = ReconnectConfig::default();
    if let Some(attempts) = profile.reconnect_attempts {
        reconnect.max_attempts = attempts;
    }
    if let Some(secs) = profile.reconnect_max_delay {
        reconnect.max_delay = Duration::from_secs(secs);
    }
    if reconnect.max_delay < reconnect.initial_delay {
        return Err(ConfigError::Validation {
            field: "reconnect_max_delay".into(),
            reason: format!(
                "must be at least {}s",
                reconnect.initial_delay.as_secs()
            ),
        });
    }

    let mut config = LiveConfig::new(api_url);
    config.live_url = live_url;
    config.push_enabled = profile.push.unwrap_or(true);
    config.upgrade_transport = profile.upgrade.unwrap_or(true);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect = reconnect;
    config.commentary_poll_interval = positive_secs(
        "commentary_interval",
        profile.commentary_interval.unwrap_or(defaults.commentary_interval),
    )?;
    if let Some(secs) = profile.snapshot_interval {
        config.snapshot_poll_interval = positive_secs("snapshot_interval", secs)?;
    }
    Ok(config)
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
