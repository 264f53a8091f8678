//! In-memory subscription registry: conversation → set of channels.

use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
};

use tracing::info;

use crate::types::{ChannelId, ConversationId, SubscribeOutcome};

/// Which channels each conversation follows.
///
/// Request handlers write, the poller snapshots once per cycle. Each
/// conversation's set is copied under the read lock, so a snapshot never
/// sees a half-updated set.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<ConversationId, HashSet<ChannelId>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `channel` to `conversation`'s set.
    pub fn subscribe(
        &self,
        conversation: impl Into<ConversationId>,
        channel: impl Into<ChannelId>,
    ) -> SubscribeOutcome {
        let conversation = conversation.into();
        let channel = channel.into();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let channels = entries.entry(conversation.clone()).or_default();
        if channels.insert(channel.clone()) {
            info!(conversation = %conversation, channel = %channel, "subscribed");
            SubscribeOutcome::Added
        } else {
            SubscribeOutcome::AlreadyPresent
        }
    }

    /// Snapshot of every conversation and the channels it follows.
    pub fn list_subscriptions(&self) -> Vec<(ConversationId, HashSet<ChannelId>)> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .map(|(conversation, channels)| (conversation.clone(), channels.clone()))
            .collect()
    }

    /// Channels followed by a single conversation.
    pub fn channels_for(&self, conversation: &ConversationId) -> HashSet<ChannelId> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(conversation).cloned().unwrap_or_default()
    }

    pub fn conversation_count(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
