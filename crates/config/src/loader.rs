use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    schema::TubewatchConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "tubewatch.toml",
    "tubewatch.yaml",
    "tubewatch.yml",
    "tubewatch.json",
];

/// Environment variable that supplies the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Environment variable that supplies the YouTube Data API key.
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<TubewatchConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./tubewatch.{toml,yaml,yml,json}`
/// 2. `~/.config/tubewatch/tubewatch.{toml,yaml,yml,json}`
///
/// Returns `TubewatchConfig::default()` if no file is found or it fails to
/// parse.
pub fn discover_and_load() -> TubewatchConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    TubewatchConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/tubewatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tubewatch").map(|d| d.config_dir().to_path_buf())
}

/// Fill empty secrets from `TELEGRAM_TOKEN` / `YOUTUBE_API_KEY`.
pub fn apply_env_overrides(config: &mut TubewatchConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(
    config: &mut TubewatchConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if config.telegram.token.expose_secret().is_empty()
        && let Some(token) = lookup(TELEGRAM_TOKEN_ENV).filter(|v| !v.is_empty())
    {
        debug!("telegram token taken from environment");
        config.telegram.token = Secret::new(token);
    }
    if config.youtube.api_key.expose_secret().is_empty()
        && let Some(key) = lookup(YOUTUBE_API_KEY_ENV).filter(|v| !v.is_empty())
    {
        debug!("youtube api key taken from environment");
        config.youtube.api_key = Secret::new(key);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<TubewatchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::unsupported_format(ext)),
    }
}
