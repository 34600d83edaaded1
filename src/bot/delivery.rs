//! Batch delivery of matched items.
//!
//! Matches are sent in fixed-size batches, each item as an image
//! document with an `Id`/`Name`/`Icon` caption. Every non-final batch
//! is followed by a "next" control carrying the next offset; the final
//! batch reports the total match count instead.

use crate::catalog::CatalogItem;
use crate::images::{ImageClient, ImageFetch, ImageMode};
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use tracing::debug;

/// Number of items delivered per batch.
pub const BATCH_SIZE: usize = 10;

/// Callback payload prefix for pagination controls.
pub const NEXT_CALLBACK_PREFIX: &str = "next#";
/// Callback payload selecting live artwork.
pub const MODE_CALLBACK_LIVE: &str = "imgsrc_live";
/// Callback payload selecting advance artwork.
pub const MODE_CALLBACK_ADVANCE: &str = "imgsrc_advance";

/// Slice bounds and follow-up control for one delivery turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// First index delivered (clamped to the match count).
    pub start: usize,
    /// One past the last index delivered.
    pub end: usize,
    /// What to append after the batch.
    pub control: BatchControl,
}

/// Follow-up control appended after a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchControl {
    /// More results remain; offer a "next" button with this offset.
    Next(usize),
    /// All results delivered; report the total match count.
    Done(usize),
}

/// Compute the slice and follow-up control for a batch at `offset`.
#[must_use]
pub fn plan_batch(total: usize, offset: usize) -> BatchPlan {
    let start = offset.min(total);
    let end = offset.saturating_add(BATCH_SIZE).min(total);
    let control = if end < total {
        BatchControl::Next(end)
    } else {
        BatchControl::Done(total)
    };
    BatchPlan {
        start,
        end,
        control,
    }
}

/// Caption for a known catalog item. Absent fields render as `N/A`.
#[must_use]
pub fn item_caption(item: &CatalogItem) -> String {
    let id = item.id_text();
    format!(
        "Id: {}\nName: {}\nIcon: {}",
        if id.is_empty() { "N/A" } else { id.as_str() },
        item.name.as_deref().unwrap_or("N/A"),
        item.icon.as_deref().unwrap_or("N/A"),
    )
}

/// Caption for an identifier with no catalog record.
#[must_use]
pub fn unknown_id_caption(id: &str) -> String {
    format!("Id: {id}\nNo text info available for this ID.")
}

/// Progress line shown under a non-final batch.
#[must_use]
pub fn progress_text(start: usize, end: usize, total: usize) -> String {
    format!("Showing results {} to {} of {}", start + 1, end, total)
}

/// Completion line shown after the final batch.
#[must_use]
pub fn completion_text(total: usize) -> String {
    format!("End of results. Total matches: {total}")
}

/// Live/Advance mode selection keyboard.
#[must_use]
pub fn mode_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Live", MODE_CALLBACK_LIVE),
        InlineKeyboardButton::callback("Advance", MODE_CALLBACK_ADVANCE),
    ]])
}

/// "Next 10 results" keyboard carrying the next offset.
#[must_use]
pub fn next_keyboard(offset: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Next 10 results",
        format!("{NEXT_CALLBACK_PREFIX}{offset}"),
    )]])
}

/// Send one known item as an image document with a caption, degrading
/// to a text-only message when the image cannot be fetched.
///
/// # Errors
///
/// Returns an error only when the outbound Telegram call fails; an
/// image fetch failure is handled by the text fallback.
pub async fn send_item(
    bot: &Bot,
    chat_id: ChatId,
    item: &CatalogItem,
    mode: ImageMode,
    images: &ImageClient,
) -> Result<()> {
    let caption = item_caption(item);
    let id = item.id_text();

    match images.fetch(&id, mode).await {
        ImageFetch::Fetched(bytes) => {
            let document = InputFile::memory(bytes).file_name(format!("{id}.png"));
            bot.send_document(chat_id, document).caption(caption).await?;
        }
        ImageFetch::Unavailable(reason) => {
            debug!(item = %id, reason = %reason, "image unavailable, sending caption only");
            bot.send_message(chat_id, caption).await?;
        }
    }
    Ok(())
}

/// Send a single image for an identifier with no catalog record.
///
/// The text fallback additionally notes that no preview is available,
/// since the caption alone carries no item information.
///
/// # Errors
///
/// Returns an error only when the outbound Telegram call fails.
pub async fn send_unknown_id(
    bot: &Bot,
    chat_id: ChatId,
    id: &str,
    mode: ImageMode,
    images: &ImageClient,
) -> Result<()> {
    let caption = unknown_id_caption(id);

    match images.fetch(id, mode).await {
        ImageFetch::Fetched(bytes) => {
            let document = InputFile::memory(bytes).file_name(format!("{id}.png"));
            bot.send_document(chat_id, document).caption(caption).await?;
        }
        ImageFetch::Unavailable(reason) => {
            debug!(item = %id, reason = %reason, "image unavailable for unknown id");
            bot.send_message(chat_id, format!("{caption}\nNo image preview available."))
                .await?;
        }
    }
    Ok(())
}

/// Deliver one batch of `items` starting at `offset`, then the paging
/// control or the completion line.
///
/// # Errors
///
/// Returns an error when an outbound Telegram call fails.
pub async fn send_batch(
    bot: &Bot,
    chat_id: ChatId,
    items: &[CatalogItem],
    offset: usize,
    mode: ImageMode,
    images: &ImageClient,
) -> Result<()> {
    let plan = plan_batch(items.len(), offset);

    for item in &items[plan.start..plan.end] {
        send_item(bot, chat_id, item, mode, images).await?;
    }

    match plan.control {
        BatchControl::Next(next_offset) => {
            bot.send_message(chat_id, progress_text(plan.start, plan.end, items.len()))
                .reply_markup(next_keyboard(next_offset))
                .await?;
        }
        BatchControl::Done(total) => {
            bot.send_message(chat_id, completion_text(total)).await?;
        }
    }
    Ok(())
}
