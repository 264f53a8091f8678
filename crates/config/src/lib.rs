//! Configuration loading, validation and env substitution.
//!
//! Config files: `tubewatch.toml`, `tubewatch.yaml`, or `tubewatch.json`
//! Searched in `./` then `~/.config/tubewatch/`.
//!
//! Supports `${ENV_VAR}` substitution in the raw file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{PollerConfig, SeedSubscription, TelegramConfig, TubewatchConfig, YoutubeConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
