use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::{debug, info, warn};

use pastebot_core::domain::Trigger;

use crate::{message_ref, router::AppState, target_message};

const HELP_TEXT: &str = "I upload text files to paste sites.\n\n\
Send a text or log file and tap the upload button under it, or reply to a message \
with /paste.\n\
Logs go to mclo.gs; everything else goes to the default site.";

const NEEDS_REPLY: &str = "Reply to a message with a file to use this command.";

fn parse_command(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let cmd = parse_command(msg.text().unwrap_or(""));
    let from = message_ref(&msg);

    match cmd.as_str() {
        "start" | "help" => reply(&state, &msg, HELP_TEXT).await,
        "paste" => {
            let Some(target) = msg.reply_to_message() else {
                reply(&state, &msg, NEEDS_REPLY).await;
                return Ok(());
            };
            let target = target_message(target);
            info!(%from, target = %target.msg, "paste command");
            let orchestrator = state.orchestrator.clone();
            tokio::spawn(async move {
                let outcome = orchestrator.handle_trigger(Trigger::Command, target).await;
                debug!(?outcome, "command workflow finished");
            });
        }
        "marker" if state.cfg.testing => {
            let Some(target) = msg.reply_to_message() else {
                reply(&state, &msg, NEEDS_REPLY).await;
                return Ok(());
            };
            let target = message_ref(target);
            if let Err(e) = state
                .messenger
                .add_marker(target, state.orchestrator.marker())
                .await
            {
                warn!(%target, error = %e, "failed to force marker");
            }
        }
        _ => debug!(%from, command = %cmd, "ignoring unknown command"),
    }

    Ok(())
}

async fn reply(state: &AppState, msg: &Message, text: &str) {
    if let Err(e) = state.messenger.reply_text(message_ref(msg), text).await {
        warn!(msg = %message_ref(msg), error = %e, "failed to reply");
    }
}
