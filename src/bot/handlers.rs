//! Command and callback handlers.
//!
//! Implements the two-step search interaction: `/id` stores a pending
//! query and asks for an image mode; the mode callback runs the search
//! and delivers the first batch; `next#` callbacks page through the
//! stored matches.

use crate::bot::delivery::{self, MODE_CALLBACK_ADVANCE, MODE_CALLBACK_LIVE, NEXT_CALLBACK_PREFIX};
use crate::bot::session::SessionStore;
use crate::catalog::Catalog;
use crate::images::{ImageClient, ImageMode};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Chat, ChatId, MessageId, User};
use teloxide::utils::command::BotCommands;
use tracing::debug;

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show usage help
    #[command(description = "Show usage help.")]
    Start,
    /// Search the catalog by ID or keywords
    #[command(description = "Search the catalog by ID or keywords.")]
    Id(String),
    /// Check bot health
    #[command(description = "Check bot health.")]
    Healthcheck,
    /// Show bot statistics
    #[command(description = "Show bot statistics.")]
    Stats,
}

/// A recognized inline-button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// An image mode was chosen for the pending query.
    SelectMode(ImageMode),
    /// The next batch starting at this offset was requested.
    NextPage(usize),
}

/// Parse an inline-button payload.
#[must_use]
pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    if let Some(offset) = data.strip_prefix(NEXT_CALLBACK_PREFIX) {
        return offset.parse().ok().map(CallbackAction::NextPage);
    }
    match data {
        MODE_CALLBACK_LIVE => Some(CallbackAction::SelectMode(ImageMode::Live)),
        MODE_CALLBACK_ADVANCE => Some(CallbackAction::SelectMode(ImageMode::Advance)),
        _ => None,
    }
}

/// Trim a raw `/id` argument, returning `None` when nothing remains.
#[must_use]
pub fn normalized_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Whether a query is purely numeric and may be treated as an item ID.
#[must_use]
pub fn is_numeric_query(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

/// Session key for an update: the acting user where one exists, the
/// chat for channels (channel posts carry no user).
#[must_use]
pub fn session_scope(chat: &Chat, user: Option<&User>) -> i64 {
    if chat.is_channel() {
        chat.id.0
    } else {
        user.map_or(chat.id.0, |u| u.id.0.cast_signed())
    }
}

const USAGE: &str = "Send /id followed by ID or keywords (e.g. /id 909050011 or /id Bunny) \
                     to search. You'll be asked to pick Live or Advance images.";

/// Handle `/start`.
///
/// # Errors
///
/// Returns an error if the Telegram API call fails.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, USAGE).await?;
    Ok(())
}

/// Handle `/id <query>`: store the pending query and ask for a mode.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn id_command(
    bot: Bot,
    msg: Message,
    raw_query: String,
    sessions: Arc<SessionStore>,
) -> Result<()> {
    let Some(query) = normalized_query(&raw_query) else {
        bot.send_message(msg.chat.id, "Usage: /id <id or keywords>").await?;
        return Ok(());
    };

    let key = session_scope(&msg.chat, msg.from.as_ref());
    sessions.begin_search(key, query).await;

    bot.send_message(msg.chat.id, "Which image type do you want?")
        .reply_markup(delivery::mode_keyboard())
        .await?;
    Ok(())
}

/// Handle `/healthcheck`.
///
/// # Errors
///
/// Returns an error if the Telegram API call fails.
pub async fn healthcheck(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, "Bot is running.").await?;
    Ok(())
}

/// Handle `/stats`: catalog size and live session count.
///
/// # Errors
///
/// Returns an error if the Telegram API call fails.
pub async fn stats(
    bot: Bot,
    msg: Message,
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
) -> Result<()> {
    let text = format!(
        "Catalog items: {}\nActive sessions: {}",
        catalog.len(),
        sessions.entry_count()
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle an inline-button press.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
    images: Arc<ImageClient>,
) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let key = session_scope(message.chat(), Some(&q.from));

    match parse_callback(data) {
        Some(CallbackAction::SelectMode(mode)) => {
            run_search(&bot, chat_id, key, mode, &catalog, &sessions, &images).await
        }
        Some(CallbackAction::NextPage(offset)) => {
            let control_msg = message.regular_message().map(|m| m.id);
            next_page(&bot, chat_id, key, offset, control_msg, &sessions, &images).await
        }
        None => {
            if data.starts_with("imgsrc_") {
                bot.send_message(chat_id, "Invalid option.").await?;
            } else {
                debug!(data, "ignoring unknown callback payload");
            }
            Ok(())
        }
    }
}

/// Run the stored query and deliver the first batch.
async fn run_search(
    bot: &Bot,
    chat_id: ChatId,
    key: i64,
    mode: ImageMode,
    catalog: &Catalog,
    sessions: &SessionStore,
    images: &ImageClient,
) -> Result<()> {
    const NO_PENDING: &str = "No pending search. Please use /id followed by your query.";

    let Some(mut session) = sessions.get(key).await else {
        bot.send_message(chat_id, NO_PENDING).await?;
        return Ok(());
    };
    let Some(query) = session.pending_query.take() else {
        bot.send_message(chat_id, NO_PENDING).await?;
        return Ok(());
    };
    session.mode = mode;

    let matches = catalog.find(&query);
    if matches.is_empty() {
        sessions.put(key, session).await;
        if is_numeric_query(&query) {
            delivery::send_unknown_id(bot, chat_id, &query, mode, images).await?;
        } else {
            bot.send_message(chat_id, "No items found matching your query.")
                .await?;
        }
        return Ok(());
    }

    session.matches = matches;
    sessions.put(key, session.clone()).await;
    delivery::send_batch(bot, chat_id, &session.matches, 0, mode, images).await
}

/// Re-render the stored match list starting at `offset`.
async fn next_page(
    bot: &Bot,
    chat_id: ChatId,
    key: i64,
    offset: usize,
    control_msg: Option<MessageId>,
    sessions: &SessionStore,
    images: &ImageClient,
) -> Result<()> {
    let session = sessions.get(key).await.filter(|s| !s.matches.is_empty());
    let Some(session) = session else {
        bot.send_message(
            chat_id,
            "No stored results found. Please use /id to search again.",
        )
        .await?;
        return Ok(());
    };

    // Best-effort removal of the paging control before re-rendering.
    if let Some(msg_id) = control_msg {
        let _ = bot.delete_message(chat_id, msg_id).await;
    }

    delivery::send_batch(bot, chat_id, &session.matches, offset, session.mode, images).await
}
