//! Last-seen item id per channel.

use std::{collections::HashMap, sync::Mutex};

use crate::types::ChannelId;

/// What [`LastSeenCache::observe`] decided for a freshly fetched item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// No entry existed; the id was stored.
    First,
    /// Same id as last time; nothing written.
    Unchanged,
    /// A different id; the entry now holds the new one.
    Changed { previous: String },
}

/// One entry per channel, shared by every conversation that follows it.
///
/// Only the poller writes here. Entries are never removed.
#[derive(Debug, Default)]
pub struct LastSeenCache {
    items: Mutex<HashMap<ChannelId, String>>,
}

impl LastSeenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: &ChannelId) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.get(channel).cloned()
    }

    /// Unconditional overwrite.
    pub fn set(&self, channel: ChannelId, item_id: impl Into<String>) {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(channel, item_id.into());
    }

    /// Compare `item_id` with the stored entry and update it in one step.
    pub fn observe(&self, channel: &ChannelId, item_id: &str) -> Observation {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        match items.get_mut(channel) {
            None => {
                items.insert(channel.clone(), item_id.to_string());
                Observation::First
            },
            Some(seen) if seen == item_id => Observation::Unchanged,
            Some(seen) => Observation::Changed {
                previous: std::mem::replace(seen, item_id.to_string()),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
