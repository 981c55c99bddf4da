use std::{fs, path::Path};

use anyhow::{bail, Context};
use chrono::FixedOffset;
use order_client::DEFAULT_SERVER_URL;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "uploader.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    /// Zone used to turn calendar dates into instants and back; local time when unset.
    pub display_utc_offset_minutes: Option<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            display_utc_offset_minutes: None,
        }
    }
}

impl Settings {
    pub fn display_offset(&self) -> Option<FixedOffset> {
        self.display_utc_offset_minutes.and_then(offset_from_minutes)
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    display_utc_offset_minutes: Option<i32>,
}

/// Defaults, then the config file, then the environment.
///
/// An explicit `config_path` must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn resolve_settings(
    raw_file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid uploader config")?;
        if let Some(v) = file_cfg.server_url {
            settings.server_url = v;
        }
        if let Some(v) = file_cfg.display_utc_offset_minutes {
            settings.display_utc_offset_minutes = Some(v);
            if settings.display_offset().is_none() {
                bail!("display_utc_offset_minutes {v} is outside -1439..=1439");
            }
        }
    }

    if let Some(v) = env("PO_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__DISPLAY_UTC_OFFSET_MINUTES") {
        match v.trim().parse::<i32>() {
            Ok(parsed) if offset_from_minutes(parsed).is_some() => {
                settings.display_utc_offset_minutes = Some(parsed);
            }
            _ => {}
        }
    }

    settings.server_url = normalize_server_url(&settings.server_url)?;
    Ok(settings)
}

pub fn normalize_server_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid server url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("server url '{trimmed}' must use http or https");
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
