//! Telegram surface for tubewatch.
//!
//! Delivers poller notifications with teloxide and accepts `/channel`
//! subscriptions over long polling.

pub mod bot;
pub mod commands;
pub mod error;
pub mod outbound;

pub use {
    bot::{build_bot, start_polling},
    error::{Error, Result},
    outbound::TelegramDispatcher,
};
