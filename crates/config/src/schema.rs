//! Config schema types (poller, telegram, youtube, seed subscriptions).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TubewatchConfig {
    pub poller: PollerConfig,
    pub telegram: TelegramConfig,
    pub youtube: YoutubeConfig,
    /// Subscriptions registered at startup. Kept in memory only.
    pub subscriptions: Vec<SeedSubscription>,
}

/// Background poller cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollerConfig {
    /// Wait between the end of one cycle and the start of the next.
    pub poll_interval_seconds: u64,
    /// Delay before the first cycle after startup.
    pub warmup_seconds: u64,
    /// Upper bound on a single channel lookup. Zero disables the bound.
    pub lookup_timeout_seconds: u64,
    /// Upper bound on delivering one notification, rate-limit waits
    /// included. Zero disables the bound.
    pub dispatch_timeout_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            warmup_seconds: 5,
            lookup_timeout_seconds: 30,
            dispatch_timeout_seconds: 60,
        }
    }
}

/// Telegram bot credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// YouTube Data API settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Secret<String>,
    /// Base URL of the Data API v3 (overridable for tests and proxies).
    pub api_base_url: String,
    /// Prefix joined with a video id to build the watch link.
    pub video_url_base: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            api_base_url: "https://www.googleapis.com/youtube/v3".into(),
            video_url_base: "https://www.youtube.com/watch?v=".into(),
        }
    }
}

impl std::fmt::Debug for YoutubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("video_url_base", &self.video_url_base)
            .finish()
    }
}

/// A `(conversation, channel)` pair to subscribe at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedSubscription {
    pub conversation: String,
    pub channel: String,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poller_cadence() {
        let cfg = TubewatchConfig::default();
        assert_eq!(cfg.poller.poll_interval_seconds, 60);
        assert_eq!(cfg.poller.warmup_seconds, 5);
        assert_eq!(cfg.poller.lookup_timeout_seconds, 30);
        assert_eq!(cfg.poller.dispatch_timeout_seconds, 60);
        assert!(cfg.subscriptions.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: TubewatchConfig = toml::from_str(
            r#"
            [poller]
            poll_interval_seconds = 120

            [[subscriptions]]
            conversation = "42"
            channel = "UC_x5XG1OV2P6uZZ5FSM9Ttw"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.poller.poll_interval_seconds, 120);
        assert_eq!(cfg.poller.warmup_seconds, 5);
        assert_eq!(cfg.subscriptions, vec![SeedSubscription {
            conversation: "42".into(),
            channel: "UC_x5XG1OV2P6uZZ5FSM9Ttw".into(),
        }]);
        assert_eq!(
            cfg.youtube.api_base_url,
            "https://www.googleapis.com/youtube/v3"
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = TelegramConfig {
            token: Secret::new("123:ABC".into()),
        };
        let out = format!("{cfg:?}");
        assert!(!out.contains("123:ABC"));
        assert!(out.contains("REDACTED"));
    }

    #[test]
    fn serialize_roundtrip_keeps_token() {
        let cfg = TubewatchConfig {
            telegram: TelegramConfig {
                token: Secret::new("tok".into()),
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TubewatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.telegram.token.expose_secret(), "tok");
    }
}
