use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, warn};

use pastebot_core::{
    confirmation::ConfirmChoice, domain::Trigger, orchestrator::WorkflowOutcome,
};

use crate::{message_ref, router::AppState, target_message, CALLBACK_UPLOAD};

const REQUEST_EXPIRED: &str = "Request expired or invalid";

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let Some(message) = q.message.as_ref() else {
        answer(&state, &q.id, None).await;
        return Ok(());
    };

    if data == CALLBACK_UPLOAD {
        // The marker is a reply to the message carrying the files.
        let Some(target) = message.reply_to_message() else {
            answer(&state, &q.id, Some("Original message is gone")).await;
            return Ok(());
        };
        let target = target_message(target);
        state.telegram.remember_marker(target.msg, message_ref(message));
        answer(&state, &q.id, None).await;

        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.handle_trigger(Trigger::Marker, target).await;
            debug!(?outcome, "marker workflow finished");
        });
        return Ok(());
    }

    if let Some(choice) = ConfirmChoice::from_callback_data(&data) {
        let prompt = message_ref(message);
        if !state.orchestrator.is_pending(prompt) {
            answer(&state, &q.id, Some(REQUEST_EXPIRED)).await;
            return Ok(());
        }
        answer(&state, &q.id, None).await;
        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.handle_confirmation(prompt, choice).await;
            if matches!(outcome, WorkflowOutcome::UnknownPrompt) {
                debug!(%prompt, "confirmation for a prompt that is no longer pending");
            }
        });
        return Ok(());
    }

    debug!(data = %data, "unknown callback data");
    answer(&state, &q.id, None).await;
    Ok(())
}

async fn answer(state: &AppState, callback_id: &str, text: Option<&str>) {
    if let Err(e) = state.messenger.answer_callback_query(callback_id, text).await {
        warn!(error = %e, "failed to answer callback query");
    }
}
