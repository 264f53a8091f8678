//! YouTube Data API v3 content lookup.
//!
//! Resolves a channel's uploads playlist, then reads its newest entry.

pub mod api;
pub mod error;
pub mod lookup;

pub use {
    error::{Error, Result},
    lookup::YoutubeLookup,
};
