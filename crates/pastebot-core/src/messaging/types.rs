/// Inline keyboard (buttons) attached to a bot message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// Keyboard with a single button.
    pub fn single(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self::new(vec![InlineButton {
            label: label.into(),
            callback_data: callback_data.into(),
        }])
    }
}

/// Limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Longest text the platform accepts, in UTF-16 code units.
    pub max_message_len: usize,
}
