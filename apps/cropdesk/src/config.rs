use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use url::Url;

pub const CONFIG_FILE: &str = "cropdesk.toml";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub log_filter: String,
    pub unprocessed_only: bool,
    pub portrait_size: (u32, u32),
    pub landscape_size: (u32, u32),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            log_filter: "info".into(),
            unprocessed_only: false,
            portrait_size: (1080, 1920),
            landscape_size: (1920, 1080),
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `key = "value"` file at `path`, then environment
/// variables looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("log_filter") {
                settings.log_filter = v.clone();
            }
            if let Some(v) = file_cfg.get("unprocessed_only").and_then(|v| parse_flag(v)) {
                settings.unprocessed_only = v;
            }
            if let Some(v) = file_cfg.get("portrait_size").and_then(|v| parse_size(v)) {
                settings.portrait_size = v;
            }
            if let Some(v) = file_cfg.get("landscape_size").and_then(|v| parse_size(v)) {
                settings.landscape_size = v;
            }
        }
    }

    if let Some(v) = env("CROPDESK_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = env("APP__UNPROCESSED_ONLY").and_then(|v| parse_flag(&v)) {
        settings.unprocessed_only = v;
    }

    settings
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `"1080x1920"` (or `1080×1920`) into `(width, height)`.
pub fn parse_size(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw
        .split_once(['x', 'X', '×'])
        .map(|(w, h)| (w.trim(), h.trim()))?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

/// Requires a scheme and ends the path with `/` so endpoints join under it.
pub fn normalize_server_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(format!("{DEFAULT_SERVER_URL}/"));
    }
    if !raw.contains("://") {
        bail!("server url '{raw}' must include a scheme, e.g. http://{raw}");
    }

    let mut url = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    if url.cannot_be_a_base() {
        bail!("server url '{raw}' cannot carry endpoint paths");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
