//! Subscription tracking and change detection.
//!
//! Conversations subscribe to channels through [`SubscriptionRegistry`].
//! [`WatcherService`] polls each tracked channel on a fixed cadence, keeps
//! the last seen item per channel in [`LastSeenCache`], and notifies every
//! subscribed conversation when a channel publishes something new.

pub mod cache;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod service;
pub mod types;

pub use {
    cache::{LastSeenCache, Observation},
    dispatch::{NotificationDispatcher, format_notification},
    error::{DispatchError, Error, LookupError, Result},
    lookup::ContentLookup,
    registry::SubscriptionRegistry,
    service::{WatcherConfig, WatcherService},
    types::{ChannelId, ConversationId, CycleReport, Item, SubscribeOutcome, WatcherStatus},
};
