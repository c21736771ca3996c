use async_trait::async_trait;

use crate::{
    domain::MessageRef,
    messaging::types::{InlineKeyboard, MessagingCapabilities},
    Result,
};

/// Cross-messenger port used by the upload workflow.
///
/// Replies are plain text. `edit_text` also clears any buttons on the edited message.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef>;
    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    async fn reply_inline_keyboard(
        &self,
        to: MessageRef,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Advertise that `msg` can be uploaded (reaction or button reply).
    async fn add_marker(&self, msg: MessageRef, marker: &str) -> Result<()>;
    /// Remove the bot's own marker from `msg`. Missing markers are not an error.
    async fn remove_marker(&self, msg: MessageRef, marker: &str) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
