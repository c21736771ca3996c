//! Telegram update handlers.
//!
//! Workflows run on spawned tasks so a long upload never blocks the dispatcher's
//! per-chat queue (a second `/paste` must see the lock, not wait behind it).

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod callback;
mod commands;
mod document;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
        return Ok(());
    }

    if msg.document().is_some() || msg.photo().is_some() {
        return document::handle_attachment(msg, state).await;
    }

    Ok(())
}
