//! CLI-owned configuration: TOML profiles and translation to
//! `lbdash_core::ControllerConfig`.
//!
//! Core never sees these types -- it receives a pre-built `ControllerConfig`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use lbdash_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config structs ──────────────────────────────────────────────

/// CLI-owned TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name (used when --profile is not specified).
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named backend profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://127.0.0.1:5000").
    pub backend: String,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "lbdash", "lbdash")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("lbdash");
            p.push("config.toml");
            p
        })
}

// ── Config loading ───────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, CliError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("LBDASH_CFG_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Write a starter config with a single default profile.
pub fn write_starter_config(backend: &str) -> Result<PathBuf, CliError> {
    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            backend: backend.to_owned(),
            timeout: None,
        },
    );

    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(&config)?)?;
    Ok(path)
}

// ── Resolution ───────────────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from flags, env, and the config file.
///
/// Precedence for the backend URL: --backend flag (or LBDASH_BACKEND)
/// over the active profile. This is the single boundary where CLI
/// config types cross into core types.
pub fn resolve(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let config = load_config_or_default();
    let profile_name = active_profile_name(global, &config);
    let profile = config.profiles.get(&profile_name);

    // An explicitly requested profile must exist; the implicit default
    // may be absent as long as --backend supplies a URL.
    if global.profile.is_some() && profile.is_none() {
        return Err(CliError::ProfileNotFound { name: profile_name });
    }

    let url_str = global
        .backend
        .as_deref()
        .or_else(|| profile.map(|p| p.backend.as_str()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;

    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let timeout_secs = profile.and_then(|p| p.timeout).unwrap_or(global.timeout);

    let mut controller_config = ControllerConfig::new(url);
    controller_config.request_timeout = Duration::from_secs(timeout_secs);
    // One-shot commands never open the stream; `logs` and `watch`
    // re-enable it themselves.
    controller_config.stream_enabled = false;
    Ok(controller_config)
}
