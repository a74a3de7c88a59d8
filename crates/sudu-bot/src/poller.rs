//! Long-polling loop over `getUpdates`

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use sudu_notify::{TelegramClient, Update};

use crate::handler::BotHandler;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Polls the Bot API and dispatches messages to the handler
pub struct BotPoller {
    client: TelegramClient,
    handler: BotHandler,
    poll_timeout_secs: u64,
}

impl BotPoller {
    pub fn new(client: TelegramClient, handler: BotHandler, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            handler,
            poll_timeout_secs,
        }
    }

    /// Poll until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let handler = match self.client.get_me().await {
            Ok(me) => {
                info!(bot_id = me.id, username = ?me.username, "Telegram bot started");
                self.handler.clone().with_username(me.username)
            }
            Err(e) => {
                warn!(error = %e, "getMe failed, starting without a bot username");
                self.handler.clone()
            }
        };

        let mut offset: Option<i64> = None;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            tokio::select! {
                result = self.client.get_updates(offset, self.poll_timeout_secs) => {
                    match result {
                        Ok(updates) => {
                            backoff = INITIAL_BACKOFF;
                            for update in updates {
                                offset = Some(update.update_id + 1);
                                self.dispatch(&handler, update).await;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, retry_in_secs = backoff.as_secs(), "getUpdates failed");
                            tokio::select! {
                                () = tokio::time::sleep(backoff) => {}
                                _ = shutdown.changed() => break,
                            }
                            backoff = (backoff * 2).min(MAX_BACKOFF);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Telegram bot stopped");
    }

    async fn dispatch(&self, handler: &BotHandler, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            debug!(update_id = update.update_id, "Skipping non-text message");
            return;
        };

        let chat_id = message.chat.chat_id();
        if let Some(reply) = handler.handle(chat_id, text).await {
            if let Err(e) = self.client.send_message(chat_id, &reply).await {
                warn!(chat_id = %chat_id, error = %e, "Failed to send reply");
            }
        }
    }
}
