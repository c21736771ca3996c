use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two outbound calls.
    pub global_min_interval: Duration,
    /// Minimum spacing between calls into the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // just under 1/sec
        }
    }
}

/// Hands out evenly spaced time slots.
#[derive(Debug)]
struct Pacer {
    interval: Duration,
    next_free: Instant,
}

impl Pacer {
    fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_free: now,
        }
    }

    /// Claim the earliest free slot at or after `now`; returns how long to wait for it.
    fn claim(&mut self, now: Instant) -> Duration {
        let slot = self.next_free.max(now);
        self.next_free = slot + self.interval;
        slot - now
    }
}

struct Pacers {
    global: Pacer,
    per_chat: HashMap<ChatId, Pacer>,
}

/// MessagingPort decorator that spaces out outbound chat calls.
///
/// Upload batches end in a burst of replies and edits; pacing keeps the bot under the
/// platform's flood limits. 429s can still happen and are left to the inner adapter.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    pacers: Mutex<Pacers>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            pacers: Mutex::new(Pacers {
                global: Pacer::new(cfg.global_min_interval, Instant::now()),
                per_chat: HashMap::new(),
            }),
        }
    }

    fn pacers(&self) -> MutexGuard<'_, Pacers> {
        self.pacers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Slots are claimed under one short lock; the wait happens after it is released.
    fn claim(&self, chat: Option<ChatId>) -> Duration {
        let now = Instant::now();
        let mut pacers = self.pacers();
        let global_wait = pacers.global.claim(now);
        let chat_wait = chat.map_or(Duration::ZERO, |chat| {
            pacers
                .per_chat
                .entry(chat)
                .or_insert_with(|| Pacer::new(self.cfg.per_chat_min_interval, now))
                .claim(now)
        });
        global_wait.max(chat_wait)
    }

    async fn pace(&self, chat: Option<ChatId>) {
        let wait = self.claim(chat);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef> {
        self.pace(Some(to.chat_id)).await;
        self.inner.reply_text(to, text).await
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.pace(Some(msg.chat_id)).await;
        self.inner.edit_text(msg, text).await
    }

    async fn reply_inline_keyboard(
        &self,
        to: MessageRef,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.pace(Some(to.chat_id)).await;
        self.inner.reply_inline_keyboard(to, text, keyboard).await
    }

    async fn add_marker(&self, msg: MessageRef, marker: &str) -> Result<()> {
        self.pace(Some(msg.chat_id)).await;
        self.inner.add_marker(msg, marker).await
    }

    async fn remove_marker(&self, msg: MessageRef, marker: &str) -> Result<()> {
        self.pace(Some(msg.chat_id)).await;
        self.inner.remove_marker(msg, marker).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        // Callback answers are not tied to a chat.
        self.pace(None).await;
        self.inner.answer_callback_query(callback_id, text).await
    }
}
