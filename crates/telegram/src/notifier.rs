use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info};

use common::{Action, Error, Notifier, Result};

use crate::report::format_batch;

/// Publishes cycle reports to a single Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    async fn send_html(&self, text: String) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| Error::Notify(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn publish_batch(&self, actions: &[Action]) -> Result<()> {
        let messages = format_batch(actions);
        let parts = messages.len();
        for message in messages {
            self.send_html(message).await?;
        }
        info!(actions = actions.len(), parts, "Cycle report sent to Telegram");
        Ok(())
    }

    async fn notify(&self, message: &str) -> Result<()> {
        self.send_html(message.to_string()).await
    }
}

/// Used when Telegram is not configured; reports only reach the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn publish_batch(&self, actions: &[Action]) -> Result<()> {
        debug!(actions = actions.len(), "Telegram disabled, cycle report not sent");
        Ok(())
    }

    async fn notify(&self, message: &str) -> Result<()> {
        debug!(message, "Telegram disabled, message not sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_notifier_accepts_everything() {
        let notifier = DisabledNotifier;
        assert!(notifier.publish_batch(&[]).await.is_ok());
        assert!(notifier.notify("<b>started</b>").await.is_ok());
    }
}
