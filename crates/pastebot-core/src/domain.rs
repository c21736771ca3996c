/// Chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id within a chat (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id: ChatId(chat_id),
            message_id: MessageId(message_id),
        }
    }
}

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id.0, self.message_id.0)
    }
}

/// Immutable snapshot of a file attached to a chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Platform file id (Telegram `file_id`).
    pub id: String,
    pub filename: String,
    /// Direct download URL, when the platform exposes one up front.
    pub url: Option<String>,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub is_image: bool,
}

/// A message as seen by the upload workflow.
#[derive(Clone, Debug)]
pub struct TargetMessage {
    pub msg: MessageRef,
    pub author_is_bot: bool,
    /// Posted through a webhook-like identity (channel post, inline bot).
    pub from_webhook: bool,
    pub attachments: Vec<Attachment>,
    /// Public link to the message, if the platform can build one.
    pub link: Option<String>,
}

impl TargetMessage {
    /// Messages the bot is allowed to act on: a human author and at least one file.
    pub fn is_eligible(&self) -> bool {
        !self.author_is_bot && !self.from_webhook && !self.attachments.is_empty()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.attachments.iter().map(|a| a.filename.as_str())
    }
}

/// What started a workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// The user activated the bot's marker on the message.
    Marker,
    /// The explicit upload command was run against the message.
    Command,
}

/// Outcome of one file in an upload batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResult {
    pub filename: String,
    pub outcome: std::result::Result<String, crate::FileError>,
}

impl UploadResult {
    /// `"<filename>\n<url-or-error>"`.
    pub fn render(&self) -> String {
        match &self.outcome {
            Ok(url) => format!("{}\n{url}", self.filename),
            Err(e) => format!("{}\n{}", self.filename, e.describe()),
        }
    }
}

/// Join per-file blocks, separated by a blank line, in the given order.
pub fn render_results(results: &[UploadResult]) -> String {
    results
        .iter()
        .map(UploadResult::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Bytes to megabytes with one decimal, e.g. `500_000` → `"0.5"`.
pub fn bytes_to_megabytes_text(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1_000_000f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileError;

    #[test]
    fn renders_results_in_given_order_with_blank_lines() {
        let results = vec![
            UploadResult {
                filename: "a.txt".to_string(),
                outcome: Ok("https://paste.gg/p/anonymous/a".to_string()),
            },
            UploadResult {
                filename: "b.txt".to_string(),
                outcome: Err(FileError::Transport("timed out".to_string())),
            },
        ];
        assert_eq!(
            render_results(&results),
            "a.txt\nhttps://paste.gg/p/anonymous/a\n\nb.txt\nTransportError: timed out"
        );
    }

    #[test]
    fn megabyte_text_has_one_decimal() {
        assert_eq!(bytes_to_megabytes_text(500_000), "0.5");
        assert_eq!(bytes_to_megabytes_text(10_000_000), "10.0");
        assert_eq!(bytes_to_megabytes_text(1_000_000), "1.0");
    }

    #[test]
    fn bot_and_webhook_messages_are_not_eligible() {
        let att = Attachment {
            id: "f".to_string(),
            filename: "a.txt".to_string(),
            url: None,
            size_bytes: 1,
            content_type: Some("text/plain".to_string()),
            is_image: false,
        };
        let mut m = TargetMessage {
            msg: MessageRef::new(1, 1),
            author_is_bot: false,
            from_webhook: false,
            attachments: vec![att],
            link: None,
        };
        assert!(m.is_eligible());
        m.author_is_bot = true;
        assert!(!m.is_eligible());
        m.author_is_bot = false;
        m.from_webhook = true;
        assert!(!m.is_eligible());
        m.from_webhook = false;
        m.attachments.clear();
        assert!(!m.is_eligible());
    }
}
