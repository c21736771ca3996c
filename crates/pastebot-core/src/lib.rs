//! Core domain + orchestration logic for the paste bot.
//!
//! This crate is intentionally framework-agnostic. The chat platform, attachment
//! downloads and paste-site HTTP calls live behind ports (traits) implemented in
//! adapter crates.

pub mod attachments;
pub mod config;
pub mod confirmation;
pub mod destinations;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod locks;
pub mod logging;
pub mod messaging;
pub mod orchestrator;

pub use errors::{Error, FileError, Result};
