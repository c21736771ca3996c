//! Telegram adapter (teloxide).
//!
//! Implements the `pastebot-core` messaging and attachment ports over the Telegram Bot API.
//! Telegram has no bot reactions here, so the marker is a reply carrying a single
//! "Upload" button; removing the marker deletes that reply.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use teloxide::{
    net::Download,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, Message},
};
use tokio::time::sleep;

pub mod handlers;
pub mod router;

use pastebot_core::{
    domain::{Attachment, ChatId, MessageId, MessageRef, TargetMessage},
    errors::Error,
    fetch::AttachmentSource,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

/// Callback data of the marker button.
pub const CALLBACK_UPLOAD: &str = "paste:upload";

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(message_id.0)
}

fn map_err(e: teloxide::RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

pub fn message_ref(msg: &Message) -> MessageRef {
    MessageRef::new(msg.chat.id.0, msg.id.0)
}

async fn with_retry<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                attempts += 1;
                tracing::debug!(retry_after = ?d, "telegram rate limited, retrying");
                sleep(d).await;
            }
            Err(other) => return Err(map_err(other)),
        }
    }
}

/// Bots may only delete their own messages for 48 hours.
const MARKER_TTL: Duration = Duration::from_secs(48 * 60 * 60);
const MAX_TRACKED_MARKERS: usize = 10_000;

/// Target message -> the bot's marker reply, for markers that can still be deleted.
#[derive(Debug)]
struct MarkerIndex {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<MessageRef, (MessageRef, Instant)>,
}

impl MarkerIndex {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: HashMap::new(),
        }
    }

    fn insert(
        &mut self,
        target: MessageRef,
        marker: MessageRef,
        now: Instant,
    ) -> Option<MessageRef> {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (_, added)| now.saturating_duration_since(*added) < ttl);
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&target) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, added))| *added)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.entries
            .insert(target, (marker, now))
            .map(|(old, _)| old)
    }

    fn remove(&mut self, target: &MessageRef, now: Instant) -> Option<MessageRef> {
        let (marker, added) = self.entries.remove(target)?;
        (now.saturating_duration_since(added) < self.ttl).then_some(marker)
    }
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    markers: Arc<Mutex<MarkerIndex>>,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            markers: Arc::new(Mutex::new(MarkerIndex::new(
                MARKER_TTL,
                MAX_TRACKED_MARKERS,
            ))),
        }
    }

    /// Record a marker reply seen in a callback (e.g. one posted before a restart).
    pub fn remember_marker(&self, target: MessageRef, marker: MessageRef) {
        self.marker_map().insert(target, marker, Instant::now());
    }

    fn marker_map(&self) -> std::sync::MutexGuard<'_, MarkerIndex> {
        self.markers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .buttons
            .into_iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
            .collect();
        InlineKeyboardMarkup::new(rows)
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
        }
    }

    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef> {
        let sent = with_retry(|| {
            self.bot
                .send_message(tg_chat(to.chat_id), text.to_string())
                .reply_to_message_id(tg_msg_id(to.message_id))
                .disable_web_page_preview(true)
        })
        .await?;
        Ok(MessageRef::new(to.chat_id.0, sent.id.0))
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        // Omitting reply_markup drops the inline keyboard.
        with_retry(|| {
            self.bot
                .edit_message_text(
                    tg_chat(msg.chat_id),
                    tg_msg_id(msg.message_id),
                    text.to_string(),
                )
                .disable_web_page_preview(true)
        })
        .await?;
        Ok(())
    }

    async fn reply_inline_keyboard(
        &self,
        to: MessageRef,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = Self::markup(keyboard);
        let sent = with_retry(|| {
            self.bot
                .send_message(tg_chat(to.chat_id), text.to_string())
                .reply_to_message_id(tg_msg_id(to.message_id))
                .reply_markup(markup.clone())
        })
        .await?;
        Ok(MessageRef::new(to.chat_id.0, sent.id.0))
    }

    async fn add_marker(&self, msg: MessageRef, marker: &str) -> Result<()> {
        let keyboard =
            InlineKeyboard::single(format!("{marker} Upload to paste site"), CALLBACK_UPLOAD);
        let reply = self.reply_inline_keyboard(msg, marker, keyboard).await?;
        let replaced = self.marker_map().insert(msg, reply, Instant::now());
        if let Some(old) = replaced {
            tracing::debug!(msg = %msg, marker = %old, "replaced existing marker");
        }
        Ok(())
    }

    async fn remove_marker(&self, msg: MessageRef, _marker: &str) -> Result<()> {
        let Some(reply) = self.marker_map().remove(&msg, Instant::now()) else {
            return Ok(());
        };
        with_retry(|| {
            self.bot
                .delete_message(tg_chat(reply.chat_id), tg_msg_id(reply.message_id))
        })
        .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

/// Downloads attachments through the Bot API file endpoint.
#[derive(Clone)]
pub struct TelegramFiles {
    bot: Bot,
}

impl TelegramFiles {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl AttachmentSource for TelegramFiles {
    async fn fetch_bytes(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let file = with_retry(|| self.bot.get_file(attachment.id.clone())).await?;
        let mut buf = Vec::with_capacity(file.meta.size as usize);
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| Error::External(format!("telegram download failed: {e}")))?;
        Ok(buf)
    }
}

fn attachment(id: &str, filename: &str, size_bytes: u64, mime: Option<String>) -> Attachment {
    let is_image = mime.as_deref().is_some_and(|m| m.starts_with("image/"));
    Attachment {
        id: id.to_string(),
        filename: filename.to_string(),
        url: None,
        size_bytes,
        content_type: mime,
        is_image,
    }
}

/// Attachments carried by a Telegram message: its document, or the largest photo size.
pub fn attachments_of(msg: &Message) -> Vec<Attachment> {
    if let Some(doc) = msg.document() {
        let name = doc.file_name.as_deref().unwrap_or("document");
        let mime = doc.mime_type.as_ref().map(|m| m.to_string());
        return vec![attachment(&doc.file.id, name, u64::from(doc.file.size), mime)];
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return vec![attachment(
            &photo.file.id,
            "photo.jpg",
            u64::from(photo.file.size),
            Some("image/jpeg".to_string()),
        )];
    }
    Vec::new()
}

pub fn target_message(msg: &Message) -> TargetMessage {
    TargetMessage {
        msg: message_ref(msg),
        author_is_bot: msg.from().is_some_and(|u| u.is_bot),
        from_webhook: msg.sender_chat().is_some() || msg.via_bot.is_some(),
        attachments: attachments_of(msg),
        link: msg.url().map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_mime_marks_attachment_as_image() {
        let a = attachment("F1", "shot.png", 10, Some("image/png".to_string()));
        assert!(a.is_image);
        assert_eq!(a.content_type.as_deref(), Some("image/png"));

        let a = attachment("F2", "latest.log", 10, Some("text/plain".to_string()));
        assert!(!a.is_image);

        let a = attachment("F3", "blob", 10, None);
        assert!(!a.is_image);
        assert!(a.url.is_none());
    }

    #[test]
    fn marker_index_forgets_expired_markers() {
        let start = Instant::now();
        let mut idx = MarkerIndex::new(Duration::from_secs(10), 100);
        idx.insert(MessageRef::new(1, 1), MessageRef::new(1, 2), start);
        idx.insert(MessageRef::new(1, 3), MessageRef::new(1, 4), start + Duration::from_secs(5));

        // Expired on lookup.
        assert_eq!(
            idx.remove(&MessageRef::new(1, 1), start + Duration::from_secs(11)),
            None
        );

        // Expired entries are pruned on insert.
        idx.insert(MessageRef::new(1, 5), MessageRef::new(1, 6), start + Duration::from_secs(20));
        assert_eq!(idx.entries.len(), 1);
        assert_eq!(
            idx.remove(&MessageRef::new(1, 5), start + Duration::from_secs(21)),
            Some(MessageRef::new(1, 6))
        );
    }

    #[test]
    fn marker_index_evicts_oldest_at_capacity() {
        let start = Instant::now();
        let mut idx = MarkerIndex::new(Duration::from_secs(3600), 2);
        idx.insert(MessageRef::new(1, 1), MessageRef::new(1, 10), start);
        idx.insert(MessageRef::new(1, 2), MessageRef::new(1, 20), start + Duration::from_secs(1));
        idx.insert(MessageRef::new(1, 3), MessageRef::new(1, 30), start + Duration::from_secs(2));

        assert_eq!(idx.entries.len(), 2);
        let now = start + Duration::from_secs(3);
        assert_eq!(idx.remove(&MessageRef::new(1, 1), now), None);
        assert_eq!(idx.remove(&MessageRef::new(1, 2), now), Some(MessageRef::new(1, 20)));
        assert_eq!(idx.remove(&MessageRef::new(1, 3), now), Some(MessageRef::new(1, 30)));
    }

    #[test]
    fn replacing_a_marker_returns_the_old_reply() {
        let start = Instant::now();
        let mut idx = MarkerIndex::new(Duration::from_secs(3600), 10);
        assert_eq!(idx.insert(MessageRef::new(1, 1), MessageRef::new(1, 2), start), None);
        assert_eq!(
            idx.insert(MessageRef::new(1, 1), MessageRef::new(1, 3), start),
            Some(MessageRef::new(1, 2))
        );
    }
}
