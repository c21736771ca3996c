use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::{router::AppState, target_message};

/// New message with a file: offer the marker if something on it can be uploaded.
pub async fn handle_attachment(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let target = target_message(&msg);
    if target.attachments.is_empty() {
        return Ok(());
    }
    state.orchestrator.offer(&target).await;
    Ok(())
}
