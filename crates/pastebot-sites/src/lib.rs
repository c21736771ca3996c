//! Paste-site adapters (reqwest).
//!
//! Each site implements `pastebot_core::destinations::PasteService`; `build_registry`
//! wires them into the priority-ordered destination registry.

use std::{sync::Arc, time::Duration};

use pastebot_core::{
    config::Config,
    destinations::{DestinationRegistry, PasteDestination, ServiceError},
    errors::Error,
    Result,
};

pub mod mclogs;
pub mod pastebin;
pub mod pastegg;

pub use mclogs::MclogsService;
pub use pastebin::PastebinService;
pub use pastegg::PasteggService;

const USER_AGENT: &str = concat!("pastebot/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 200;

pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::External(format!("http client build failed: {e}")))
}

/// All destinations in priority order: mclo.gs, paste.gg, then Pastebin (if keyed).
pub fn build_registry(cfg: &Config) -> Result<DestinationRegistry> {
    let http = http_client(cfg.http_timeout)?;

    let mut destinations = vec![
        PasteDestination::new(
            mclogs::SITE_NAME,
            mclogs::MAX_SIZE_BYTES,
            Arc::new(MclogsService::new(http.clone())),
        )
        .with_patterns(mclogs::PREFERRED_PATTERNS)?,
        PasteDestination::new(
            pastegg::SITE_NAME,
            pastegg::MAX_SIZE_BYTES,
            Arc::new(PasteggService::new(http.clone())),
        ),
    ];

    if let Some(key) = &cfg.pastebin_key {
        destinations.push(PasteDestination::new(
            pastebin::SITE_NAME,
            pastebin::MAX_SIZE_BYTES,
            Arc::new(PastebinService::new(http, key.clone())),
        ));
    }

    DestinationRegistry::new(destinations, &cfg.default_site)
}

/// `"<status>"` or `"<status> <body excerpt>"` for non-success responses.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let excerpt: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if excerpt.is_empty() {
        ServiceError::Status(status.to_string())
    } else {
        ServiceError::Status(format!("{status} {excerpt}"))
    }
}

pub(crate) fn request_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Request(e.to_string())
}
