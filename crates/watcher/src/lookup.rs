//! Content lookup seam: fetch a channel's most recent item.

use async_trait::async_trait;

use crate::{
    error::LookupError,
    types::{ChannelId, Item},
};

/// Resolves the latest item published by a channel.
///
/// Implementations report every failure mode as a [`LookupError`]; the
/// poller only relies on the three fields of [`Item`].
#[async_trait]
pub trait ContentLookup: Send + Sync {
    async fn latest_item(&self, channel: &ChannelId) -> Result<Item, LookupError>;
}
