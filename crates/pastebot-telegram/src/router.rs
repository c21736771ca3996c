use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use pastebot_core::{
    config::Config,
    destinations::DestinationRegistry,
    locks::{InMemoryLockTable, LockTable},
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    orchestrator::UploadOrchestrator,
};

use crate::{handlers, TelegramFiles, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub orchestrator: Arc<UploadOrchestrator>,
    pub messenger: Arc<dyn MessagingPort>,
    /// Unthrottled adapter, for marker bookkeeping.
    pub telegram: Arc<TelegramMessenger>,
}

pub async fn run_polling(cfg: Arc<Config>, registry: DestinationRegistry) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "pastebot started"),
        Err(e) => warn!(error = %e, "get_me failed"),
    }
    let sites: Vec<&str> = registry.all().iter().map(|d| d.name()).collect();
    info!(
        destinations = %sites.join(", "),
        default = registry.default_destination().name(),
        testing = cfg.testing,
        "paste destinations registered"
    );

    // Throttle outbound calls to stay under Telegram's flood limits; the adapter still
    // retries once on RetryAfter.
    let telegram = Arc::new(TelegramMessenger::new(bot.clone()));
    let raw_messenger: Arc<dyn MessagingPort> = telegram.clone();
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let locks: Arc<dyn LockTable> = Arc::new(InMemoryLockTable::new());
    let orchestrator = Arc::new(UploadOrchestrator::new(
        cfg.orchestrator_config(),
        Arc::new(registry),
        locks,
        Arc::new(TelegramFiles::new(bot.clone())),
        messenger.clone(),
    ));

    let state = Arc::new(AppState {
        cfg,
        orchestrator,
        messenger,
        telegram,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
