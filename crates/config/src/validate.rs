//! Semantic checks on a loaded configuration.

use secrecy::ExposeSecret;

use crate::schema::TubewatchConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "poller.poll_interval_seconds"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check cadence values and required credentials.
pub fn validate(config: &TubewatchConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.poller.poll_interval_seconds == 0 {
        result.push(
            Severity::Error,
            "poller.poll_interval_seconds",
            "poll interval must be at least one second",
        );
    }
    if config.poller.warmup_seconds > config.poller.poll_interval_seconds {
        result.push(
            Severity::Warning,
            "poller.warmup_seconds",
            format!(
                "warm-up ({}s) is longer than the poll interval ({}s); early subscriptions wait past the first cadence window",
                config.poller.warmup_seconds, config.poller.poll_interval_seconds
            ),
        );
    }
    if config.poller.lookup_timeout_seconds == 0 {
        result.push(
            Severity::Warning,
            "poller.lookup_timeout_seconds",
            "lookups are unbounded; a hung request stalls the whole cycle",
        );
    }
    if config.telegram.token.expose_secret().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            "missing bot token (set it in the config or TELEGRAM_TOKEN)",
        );
    }
    if config.youtube.api_key.expose_secret().is_empty() {
        result.push(
            Severity::Error,
            "youtube.api_key",
            "missing API key (set it in the config or YOUTUBE_API_KEY)",
        );
    }
    for (idx, seed) in config.subscriptions.iter().enumerate() {
        if seed.conversation.trim().is_empty() || seed.channel.trim().is_empty() {
            result.push(
                Severity::Warning,
                &format!("subscriptions[{idx}]"),
                "empty conversation or channel, entry is ignored",
            );
        }
    }

    result
}
