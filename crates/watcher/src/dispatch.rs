//! Outbound notification seam.

use async_trait::async_trait;

use crate::{
    error::DispatchError,
    types::{ChannelId, ConversationId, Item},
};

/// Delivers a text message to a conversation.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, conversation: &ConversationId, message: &str)
    -> Result<(), DispatchError>;
}

/// Text sent to subscribers when `channel` publishes `item`.
pub fn format_notification(channel: &ChannelId, item: &Item) -> String {
    format!("New item from {channel}: {}\n{}", item.title, item.url)
}
