use std::{sync::Arc, time::Duration};

use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use tubewatch_watcher::{ConversationId, SubscriptionRegistry};

use crate::{
    Result,
    commands::{self, parse_command},
    outbound::send_text,
};

/// Long-poll timeout passed to `getUpdates`, in seconds.
const LONG_POLL_TIMEOUT_SECS: u32 = 30;

/// Build a bot whose HTTP client outlives the long-poll timeout.
pub fn build_bot(token: &str) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(45))
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Start polling for bot commands.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    bot: Bot,
    registry: Arc<SubscriptionRegistry>,
) -> Result<CancellationToken> {
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Long polling does not work while a webhook is set.
    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("channel", "Subscribe to a channel's new uploads"),
        BotCommand::new("start", "Show available commands"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                () = cancel_clone.cancelled() => break,
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(LONG_POLL_TIMEOUT_SECS)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                if let Err(e) = handle_message(
                                    &bot,
                                    &msg,
                                    bot_username.as_deref(),
                                    &registry,
                                )
                                .await
                                {
                                    error!(
                                        chat_id = msg.chat.id.0,
                                        error = %e,
                                        "error handling telegram message"
                                    );
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!("telegram polling stopped: another instance is running with this token");
                    cancel_clone.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel_clone.cancelled() => break,
                        () = tokio::time::sleep(Duration::from_secs(5)) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    });

    Ok(cancel)
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    bot_username: Option<&str>,
    registry: &SubscriptionRegistry,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(command) = parse_command(text, bot_username) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-command message");
        return Ok(());
    };

    let conversation = ConversationId::new(msg.chat.id.0.to_string());
    let reply = commands::execute(&command, &conversation, registry);
    send_text(bot, msg.chat.id, &reply).await?;
    Ok(())
}
