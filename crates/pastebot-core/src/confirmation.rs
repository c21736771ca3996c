//! "Some files look invalid, upload anyway?" state.
//!
//! A `PendingConfirmation` is the AwaitingConfirmation state of a workflow: it owns the
//! message lock plus the attachment lists each answer leads to. The store keys pending
//! prompts by the prompt message so the button handler can pick them back up.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio_util::sync::CancellationToken;

use crate::{
    attachments::Classification,
    destinations::PasteDestination,
    domain::{Attachment, MessageRef},
    locks::WorkflowLock,
    messaging::types::{InlineButton, InlineKeyboard},
};

pub const CALLBACK_YES: &str = "paste:yes";
pub const CALLBACK_NO: &str = "paste:no";

pub const NOTHING_TO_UPLOAD: &str = "Nothing to upload";
pub const CONFIRMATION_EXPIRED: &str = "Upload request expired";

/// The two answers to the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmChoice {
    /// "Yes": upload every size-valid attachment regardless of type.
    UploadAll,
    /// "No": upload only the valid-type attachments.
    ValidOnly,
}

impl ConfirmChoice {
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            CALLBACK_YES => Some(Self::UploadAll),
            CALLBACK_NO => Some(Self::ValidOnly),
            _ => None,
        }
    }

    pub fn callback_data(self) -> &'static str {
        match self {
            Self::UploadAll => CALLBACK_YES,
            Self::ValidOnly => CALLBACK_NO,
        }
    }
}

pub struct PendingConfirmation {
    pub lock: WorkflowLock,
    pub destination: Arc<PasteDestination>,
    pub classification: Classification,
    /// Prefix line for the eventual reply (link back to the target message).
    pub header: Option<String>,
    cancel: CancellationToken,
}

impl PendingConfirmation {
    pub fn new(
        lock: WorkflowLock,
        destination: Arc<PasteDestination>,
        classification: Classification,
        header: Option<String>,
    ) -> Self {
        Self {
            lock,
            destination,
            classification,
            header,
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled once the prompt is answered; stops the expiry timer.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Attachments to upload for `choice`; empty means there is nothing to upload.
    pub fn attachments_for(&self, choice: ConfirmChoice) -> &[Attachment] {
        match choice {
            ConfirmChoice::UploadAll => &self.classification.within_limit,
            ConfirmChoice::ValidOnly => &self.classification.valid_type,
        }
    }

    pub fn prompt_text(&self) -> String {
        build_prompt(self.header.as_deref(), &self.classification)
    }
}

pub fn build_prompt(header: Option<&str>, classification: &Classification) -> String {
    let valid_files = if classification.valid_type.is_empty() {
        "None".to_string()
    } else {
        file_list(classification.valid_type.iter())
    };
    let invalid_files = file_list(classification.invalid_type());

    let body = format!(
        "The following files are valid to upload:\n{valid_files}\n\
         However the following seem invalid:\n{invalid_files}\n\n\
         Would you like to upload the invalid files too regardless?"
    );
    with_header(header, &body)
}

pub fn prompt_keyboard() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        InlineButton {
            label: "Yes".to_string(),
            callback_data: ConfirmChoice::UploadAll.callback_data().to_string(),
        },
        InlineButton {
            label: "No".to_string(),
            callback_data: ConfirmChoice::ValidOnly.callback_data().to_string(),
        },
    ])
}

/// `header\n\nbody`, or just `body`.
pub fn with_header(header: Option<&str>, body: &str) -> String {
    match header {
        Some(h) if !h.is_empty() => format!("{h}\n\n{body}"),
        _ => body.to_string(),
    }
}

fn file_list<'a>(files: impl Iterator<Item = &'a Attachment>) -> String {
    files
        .map(|a| format!("- {}", a.filename))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pending prompts keyed by the prompt message.
#[derive(Default)]
pub struct ConfirmationStore {
    pending: Mutex<HashMap<MessageRef, PendingConfirmation>>,
}

impl ConfirmationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<MessageRef, PendingConfirmation>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, prompt: MessageRef, pending: PendingConfirmation) {
        self.map().insert(prompt, pending);
    }

    /// Remove the prompt's state and stop its expiry timer.
    pub fn take(&self, prompt: MessageRef) -> Option<PendingConfirmation> {
        let pending = self.map().remove(&prompt)?;
        pending.cancel.cancel();
        Some(pending)
    }

    pub fn contains(&self, prompt: MessageRef) -> bool {
        self.map().contains_key(&prompt)
    }
}
