//! Chat-platform abstractions (Telegram today; the shape also fits reaction-based platforms).

pub mod port;
pub mod throttled;
pub mod types;
