use std::sync::Arc;

use anyhow::Context;
use pastebot_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pastebot_core::logging::init("pastebot")?;

    let cfg = Arc::new(Config::load()?);
    let registry = pastebot_sites::build_registry(&cfg).context("building paste destinations")?;
    tracing::debug!(
        confirmation_timeout = ?cfg.confirmation_timeout,
        max_concurrent_uploads = cfg.max_concurrent_uploads,
        "configuration loaded"
    );

    pastebot_telegram::router::run_polling(cfg, registry)
        .await
        .context("telegram bot failed")
}
