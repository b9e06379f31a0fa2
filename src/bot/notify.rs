//! Group notification delivery
//!
//! Abstracts "send one HTML message to the configured group" behind the
//! [`Notifier`] trait so the poll cycle can be exercised without Telegram.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

/// Sink for OTP notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one HTML-formatted notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be sent.
    async fn notify(&self, text: &str) -> Result<()>;
}

/// [`Notifier`] that posts to one fixed Telegram group
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    /// Create a notifier bound to one group chat.
    #[must_use]
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}
