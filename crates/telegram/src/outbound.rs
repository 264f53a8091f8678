use std::time::Duration;

use {
    async_trait::async_trait,
    teloxide::{RequestError, prelude::*, types::ChatId},
    tracing::{debug, warn},
};

use tubewatch_watcher::{ConversationId, DispatchError, NotificationDispatcher};

use crate::{Error, Result};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends poller notifications as plain Telegram messages.
pub struct TelegramDispatcher {
    bot: Bot,
}

impl TelegramDispatcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl NotificationDispatcher for TelegramDispatcher {
    async fn notify(
        &self,
        conversation: &ConversationId,
        message: &str,
    ) -> std::result::Result<(), DispatchError> {
        let chat_id =
            parse_chat_id(conversation).map_err(|e| DispatchError::new(conversation.clone(), e))?;
        send_text(&self.bot, chat_id, message)
            .await
            .map_err(|e| DispatchError::new(conversation.clone(), e))
    }
}

/// Telegram chat ids are signed integers; anything else cannot be addressed.
pub fn parse_chat_id(conversation: &ConversationId) -> Result<ChatId> {
    conversation
        .as_str()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::invalid_chat_id(conversation.as_str()))
}

/// Send `text`, honouring Telegram's `retry_after` hints a few times.
pub(crate) async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
) -> std::result::Result<(), RequestError> {
    let mut retries = 0usize;

    loop {
        match bot.send_message(chat_id, text).await {
            Ok(message) => {
                debug!(chat_id = chat_id.0, message_id = message.id.0, "telegram message sent");
                return Ok(());
            },
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id = chat_id.0,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id = chat_id.0,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
