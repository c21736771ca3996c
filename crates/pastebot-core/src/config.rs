use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, orchestrator::OrchestratorConfig, Result};

const ENV_PREFIX: &str = "PASTEBOT_";

/// Spiral notepad, the marker shown on uploadable messages.
pub const DEFAULT_MARKER: &str = "\u{1F5D2}\u{FE0F}";

/// Typed configuration, read once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub bot_token: String,
    pub pastebin_key: Option<String>,

    // Behavior flags
    pub testing: bool,
    pub default_site: String,
    pub marker: String,

    // Workflow limits
    pub confirmation_timeout: Duration,
    pub max_concurrent_uploads: usize,
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Keys are given without the `PASTEBOT_` prefix.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let bot_token = get("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(format!(
                "{ENV_PREFIX}BOT_TOKEN environment variable is required"
            )));
        }

        let pastebin_key = get("PASTEBIN_KEY").and_then(non_empty);
        let testing = get("TESTING").as_deref().map(parse_bool).unwrap_or(false);
        let default_site = get("DEFAULT_SITE")
            .and_then(non_empty)
            .unwrap_or_else(|| "paste.gg".to_string());
        let marker = get("MARKER")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_MARKER.to_string());

        let confirmation_timeout = Duration::from_secs(
            get("CONFIRMATION_TIMEOUT_SECS")
                .as_deref()
                .and_then(parse_u64)
                .unwrap_or(900),
        );
        let max_concurrent_uploads = get("MAX_CONCURRENT_UPLOADS")
            .as_deref()
            .and_then(parse_u64)
            .unwrap_or(8)
            .max(1) as usize;
        let http_timeout = Duration::from_secs(
            get("HTTP_TIMEOUT_SECS")
                .as_deref()
                .and_then(parse_u64)
                .unwrap_or(30),
        );

        Ok(Self {
            bot_token,
            pastebin_key,
            testing,
            default_site,
            marker,
            confirmation_timeout,
            max_concurrent_uploads,
            http_timeout,
        })
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            marker: self.marker.clone(),
            confirmation_timeout: self.confirmation_timeout,
            max_concurrent_uploads: self.max_concurrent_uploads,
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

/// Strip optional surrounding quotes.
fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("PASTEBOT_{k}"), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(cfg(&[]), Err(Error::Config(_))));
        assert!(matches!(cfg(&[("BOT_TOKEN", "  ")]), Err(Error::Config(_))));
    }

    #[test]
    fn defaults_apply() {
        let c = cfg(&[("BOT_TOKEN", "t")]).unwrap();
        assert_eq!(c.pastebin_key, None);
        assert!(!c.testing);
        assert_eq!(c.default_site, "paste.gg");
        assert_eq!(c.marker, DEFAULT_MARKER);
        assert_eq!(c.confirmation_timeout, Duration::from_secs(900));
        assert_eq!(c.max_concurrent_uploads, 8);
        assert_eq!(c.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let c = cfg(&[
            ("BOT_TOKEN", "t"),
            ("PASTEBIN_KEY", "k"),
            ("TESTING", "TRUE"),
            ("DEFAULT_SITE", "mclo.gs"),
            ("CONFIRMATION_TIMEOUT_SECS", "60"),
            ("MAX_CONCURRENT_UPLOADS", "0"),
        ])
        .unwrap();
        assert_eq!(c.pastebin_key.as_deref(), Some("k"));
        assert!(c.testing);
        assert_eq!(c.default_site, "mclo.gs");
        assert_eq!(c.confirmation_timeout, Duration::from_secs(60));
        // Clamped to at least one permit.
        assert_eq!(c.max_concurrent_uploads, 1);
    }

    #[test]
    fn unquotes_dotenv_values() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\""), "\"");
    }
}
