//! Identifiers and values shared by the registry, cache and poller.

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Destination that receives notifications (a Telegram chat, for example).
    ConversationId
);

opaque_id!(
    /// External content channel, as supplied by the user. Never validated
    /// until the first lookup.
    ChannelId
);

/// Most recent item published by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Result of [`crate::registry::SubscriptionRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Added,
    AlreadyPresent,
}

/// Counters for a single poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Distinct channels looked up (one lookup per channel per cycle).
    pub channels_checked: usize,
    /// Channels seen for the first time; stored without notifying.
    pub first_observations: usize,
    pub unchanged: usize,
    pub changes: usize,
    pub notifications_sent: usize,
    pub lookup_failures: usize,
    pub dispatch_failures: usize,
}

/// Poller status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherStatus {
    pub running: bool,
    pub cycles_completed: u64,
    pub conversations: usize,
    /// Channels with a last-seen entry.
    pub channels_tracked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleReport>,
}
