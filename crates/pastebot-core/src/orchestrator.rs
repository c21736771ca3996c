//! Upload workflow for one message.
//!
//! Locked → Classifying → {AwaitingConfirmation | Uploading} → Replied, with the message
//! lock held by a `WorkflowLock` for the whole run. Uploads fan out as one task per
//! file; per-file failures become result entries and never abort the batch.

use std::{sync::Arc, time::Duration};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    attachments::{classify, is_offerable, to_log_string},
    confirmation::{
        prompt_keyboard, with_header, ConfirmChoice, ConfirmationStore, PendingConfirmation,
        CONFIRMATION_EXPIRED, NOTHING_TO_UPLOAD,
    },
    destinations::{DestinationRegistry, PasteDestination},
    domain::{render_results, Attachment, MessageRef, TargetMessage, Trigger, UploadResult},
    fetch::{fetch_contents, AttachmentSource},
    locks::{LockTable, WorkflowLock},
    messaging::port::MessagingPort,
    FileError,
};

pub const MESSAGE_HAS_LOCK: &str = "Already creating a paste for this message!";
pub const MESSAGE_NOT_UPLOADABLE: &str = "This message has no file attachments I can upload!";

const TRUNCATED: &str = "\n…";

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Marker emoji advertised on uploadable messages.
    pub marker: String,
    /// How long a Yes/No prompt holds the message lock before it expires.
    pub confirmation_timeout: Duration,
    /// Upper bound on file uploads in flight across all workflows.
    pub max_concurrent_uploads: usize,
}

/// How a workflow invocation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Trigger did not pass the eligibility checks.
    Ignored,
    AlreadyInProgress,
    NothingWithinLimit,
    AwaitingConfirmation { prompt: MessageRef },
    /// The prompt could not be posted; the lock was released.
    PromptFailed,
    NothingToUpload,
    /// Button press for a prompt that is no longer pending.
    UnknownPrompt,
    Uploaded { results: Vec<UploadResult> },
}

pub struct UploadOrchestrator {
    cfg: OrchestratorConfig,
    registry: Arc<DestinationRegistry>,
    locks: Arc<dyn LockTable>,
    source: Arc<dyn AttachmentSource>,
    messenger: Arc<dyn MessagingPort>,
    confirmations: Arc<ConfirmationStore>,
    upload_permits: Arc<Semaphore>,
}

impl UploadOrchestrator {
    pub fn new(
        cfg: OrchestratorConfig,
        registry: Arc<DestinationRegistry>,
        locks: Arc<dyn LockTable>,
        source: Arc<dyn AttachmentSource>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        let upload_permits = Arc::new(Semaphore::new(cfg.max_concurrent_uploads.max(1)));
        Self {
            cfg,
            registry,
            locks,
            source,
            messenger,
            confirmations: Arc::new(ConfirmationStore::new()),
            upload_permits,
        }
    }

    pub fn marker(&self) -> &str {
        &self.cfg.marker
    }

    /// Whether `prompt` is a confirmation prompt still waiting for an answer.
    pub fn is_pending(&self, prompt: MessageRef) -> bool {
        self.confirmations.contains(prompt)
    }

    /// Message-created hook: add the marker if the message has an uploadable text file.
    pub async fn offer(&self, message: &TargetMessage) -> bool {
        if !message.is_eligible() {
            return false;
        }
        debug!(
            msg = %message.msg,
            attachments = %to_log_string(&message.attachments),
            "message has attachments"
        );

        let destination = self.registry.preferred_for(message.filenames());
        let text_files: Vec<Attachment> = message
            .attachments
            .iter()
            .filter(|a| is_offerable(a, destination.max_size_bytes()))
            .cloned()
            .collect();
        if text_files.is_empty() {
            debug!(msg = %message.msg, "no text attachments");
            return false;
        }
        info!(
            msg = %message.msg,
            attachments = %to_log_string(&text_files),
            "has text attachments"
        );

        if let Err(e) = self.messenger.add_marker(message.msg, &self.cfg.marker).await {
            warn!(msg = %message.msg, error = %e, "failed to add marker");
            return false;
        }
        debug!(msg = %message.msg, "added marker");
        true
    }

    /// Run the workflow for a marker activation or upload command.
    pub async fn handle_trigger(&self, trigger: Trigger, message: TargetMessage) -> WorkflowOutcome {
        let header = match trigger {
            Trigger::Command => message.link.as_ref().map(|l| format!("Message: {l}")),
            Trigger::Marker => None,
        };

        if !message.is_eligible() {
            debug!(msg = %message.msg, ?trigger, "ignoring ineligible trigger");
            if trigger == Trigger::Command {
                self.reply(
                    message.msg,
                    &with_header(header.as_deref(), MESSAGE_NOT_UPLOADABLE),
                )
                .await;
            }
            return WorkflowOutcome::Ignored;
        }
        info!(msg = %message.msg, ?trigger, "received upload trigger");

        let Some(lock) = WorkflowLock::acquire(&self.locks, message.msg) else {
            self.reply(message.msg, &with_header(header.as_deref(), MESSAGE_HAS_LOCK))
                .await;
            return WorkflowOutcome::AlreadyInProgress;
        };

        self.spawn_marker_cleanup(message.msg);

        let destination = self.registry.preferred_for(message.filenames());
        let classification = classify(&message.attachments, destination.max_size_bytes());
        if classification.within_limit.is_empty() {
            let text = format!(
                "This message has no file attachments within the size limit of {} MB for {}!",
                destination.max_size_text(),
                destination.name()
            );
            self.reply(message.msg, &with_header(header.as_deref(), &text))
                .await;
            return WorkflowOutcome::NothingWithinLimit;
        }
        debug!(
            msg = %message.msg,
            site = destination.name(),
            attachments = %to_log_string(&classification.within_limit),
            "attachments within size limit"
        );

        if classification.needs_confirmation() {
            let pending = PendingConfirmation::new(lock, destination, classification, header);
            return self.ask_confirmation(message.msg, pending).await;
        }

        let results = self
            .upload_batch(&destination, &classification.valid_type)
            .await;
        let text = with_header(header.as_deref(), &render_results(&results));
        self.reply(message.msg, &text).await;
        drop(lock);
        WorkflowOutcome::Uploaded { results }
    }

    /// Resolve a pending Yes/No prompt. The prompt message is edited with the outcome.
    pub async fn handle_confirmation(
        &self,
        prompt: MessageRef,
        choice: ConfirmChoice,
    ) -> WorkflowOutcome {
        let Some(pending) = self.confirmations.take(prompt) else {
            debug!(%prompt, "no pending confirmation for prompt");
            return WorkflowOutcome::UnknownPrompt;
        };
        let msg = pending.lock.message();
        info!(%msg, ?choice, "confirmation answered");

        let attachments = pending.attachments_for(choice).to_vec();
        if attachments.is_empty() {
            let text = with_header(pending.header.as_deref(), NOTHING_TO_UPLOAD);
            drop(pending);
            self.edit(prompt, &text).await;
            return WorkflowOutcome::NothingToUpload;
        }

        let results = self.upload_batch(&pending.destination, &attachments).await;
        let text = with_header(pending.header.as_deref(), &render_results(&results));
        self.edit(prompt, &text).await;
        drop(pending);
        WorkflowOutcome::Uploaded { results }
    }

    async fn ask_confirmation(
        &self,
        msg: MessageRef,
        pending: PendingConfirmation,
    ) -> WorkflowOutcome {
        let text = self.fit(&pending.prompt_text());
        match self
            .messenger
            .reply_inline_keyboard(msg, &text, prompt_keyboard())
            .await
        {
            Ok(prompt) => {
                let token = pending.cancel_token();
                self.confirmations.insert(prompt, pending);
                self.spawn_expiry(prompt, token);
                info!(%msg, %prompt, "awaiting upload confirmation");
                WorkflowOutcome::AwaitingConfirmation { prompt }
            }
            Err(e) => {
                warn!(%msg, error = %e, "failed to send confirmation prompt");
                WorkflowOutcome::PromptFailed
            }
        }
    }

    /// Fetch + submit every attachment concurrently; results keep attachment order.
    async fn upload_batch(
        &self,
        destination: &Arc<PasteDestination>,
        attachments: &[Attachment],
    ) -> Vec<UploadResult> {
        let tasks: Vec<_> = attachments
            .iter()
            .cloned()
            .map(|att| {
                let filename = att.filename.clone();
                let source = Arc::clone(&self.source);
                let destination = Arc::clone(destination);
                let permits = Arc::clone(&self.upload_permits);
                let handle = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| FileError::Task(format!("upload slots closed: {e}")))?;
                    debug!(filename = %att.filename, site = destination.name(), "handling upload");
                    let contents =
                        fetch_contents(source.as_ref(), &att, destination.max_size_bytes())
                            .await?;
                    destination.submit(&att.filename, &contents).await
                });
                (filename, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (filename, handle) in tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(FileError::Task(format!("upload task failed: {e}"))),
            };
            if let Err(e) = &outcome {
                warn!(%filename, error = %e, "upload failed");
            }
            results.push(UploadResult { filename, outcome });
        }
        results
    }

    fn spawn_marker_cleanup(&self, msg: MessageRef) {
        let messenger = Arc::clone(&self.messenger);
        let marker = self.cfg.marker.clone();
        tokio::spawn(async move {
            match messenger.remove_marker(msg, &marker).await {
                Ok(()) => debug!(%msg, "removed marker"),
                Err(e) => warn!(%msg, error = %e, "failed to remove marker"),
            }
        });
    }

    fn spawn_expiry(&self, prompt: MessageRef, cancel: CancellationToken) {
        let store = Arc::clone(&self.confirmations);
        let messenger = Arc::clone(&self.messenger);
        let timeout = self.cfg.confirmation_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let Some(pending) = store.take(prompt) else {
                        return;
                    };
                    let msg = pending.lock.message();
                    let text = with_header(pending.header.as_deref(), CONFIRMATION_EXPIRED);
                    drop(pending);
                    info!(%msg, %prompt, "confirmation expired");
                    if let Err(e) = messenger.edit_text(prompt, &text).await {
                        warn!(%prompt, error = %e, "failed to mark prompt expired");
                    }
                }
            }
        });
    }

    fn fit(&self, text: &str) -> String {
        fit_message(text, self.messenger.capabilities().max_message_len)
    }

    async fn reply(&self, to: MessageRef, text: &str) {
        let text = self.fit(text);
        match self.messenger.reply_text(to, &text).await {
            Ok(_) => debug!(msg = %to, "replied:\n{text}"),
            Err(e) => warn!(msg = %to, error = %e, "failed to send reply"),
        }
    }

    async fn edit(&self, msg: MessageRef, text: &str) {
        let text = self.fit(text);
        match self.messenger.edit_text(msg, &text).await {
            Ok(()) => debug!(%msg, "edited:\n{text}"),
            Err(e) => warn!(%msg, error = %e, "failed to edit message"),
        }
    }
}

/// Cut `text` to at most `max_len` UTF-16 code units, ending it with an ellipsis line.
fn fit_message(text: &str, max_len: usize) -> String {
    if text.encode_utf16().count() <= max_len {
        return text.to_string();
    }
    let budget = max_len.saturating_sub(TRUNCATED.encode_utf16().count());
    let mut used = 0;
    let mut out = String::with_capacity(text.len().min(max_len * 4));
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push_str(TRUNCATED);
    out
}
