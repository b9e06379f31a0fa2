//! Command handlers for the bot
//!
//! `/start` replies with a static welcome; `/numbers` lists the account's
//! provisioned numbers. Replies always go to the requesting chat, never to
//! the notification group.

use std::sync::Arc;

use anyhow::Result;
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};
use tracing::{info, warn};

use crate::bot::views;
use crate::provider::SmsProvider;

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// List provisioned numbers and their status
    #[command(description = "List your numbers.")]
    Numbers,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let user_id = msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed());
    info!("User {user_id} initiated /start command.");

    bot.send_message(msg.chat.id, views::WELCOME_TEXT).await?;
    Ok(())
}

/// Numbers handler
///
/// A failed provider fetch is reported as such rather than being folded
/// into the "no numbers" reply.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn numbers(bot: Bot, msg: Message, provider: Arc<dyn SmsProvider>) -> Result<()> {
    let user_id = msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed());
    info!("User {user_id} initiated /numbers command.");

    let text = numbers_reply(provider.as_ref()).await;
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn numbers_reply(provider: &dyn SmsProvider) -> String {
    match provider.list_numbers().await {
        Ok(numbers) => views::render_numbers_list(&numbers),
        Err(e) => {
            warn!("Listing numbers failed: {e}");
            views::PROVIDER_UNAVAILABLE_TEXT.to_string()
        }
    }
}
