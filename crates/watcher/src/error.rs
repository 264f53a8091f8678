use thiserror::Error;

use crate::types::{ChannelId, ConversationId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to fetch the latest item of a channel.
///
/// Unknown channels, transport faults, malformed payloads and empty result
/// sets all land here; callers never look past the channel and the cause.
#[derive(Debug, Error)]
#[error("lookup failed for channel {channel}: {source}")]
pub struct LookupError {
    pub channel: ChannelId,
    #[source]
    pub source: BoxError,
}

impl LookupError {
    #[must_use]
    pub fn new(channel: impl Into<ChannelId>, source: impl Into<BoxError>) -> Self {
        Self {
            channel: channel.into(),
            source: source.into(),
        }
    }
}

/// Failure to deliver a notification to a conversation.
#[derive(Debug, Error)]
#[error("dispatch to {conversation} failed: {source}")]
pub struct DispatchError {
    pub conversation: ConversationId,
    #[source]
    pub source: BoxError,
}

impl DispatchError {
    #[must_use]
    pub fn new(conversation: impl Into<ConversationId>, source: impl Into<BoxError>) -> Self {
        Self {
            conversation: conversation.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("watcher is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, Error>;
