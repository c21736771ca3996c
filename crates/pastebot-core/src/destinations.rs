//! Paste destinations and the priority-ordered registry that picks one per message.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::{domain::bytes_to_megabytes_text, errors::Error, FileError, Result};

/// Why a paste site did not hand back a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Non-success HTTP status (and a short body excerpt, if any).
    #[error("{0}")]
    Status(String),

    /// The site answered but reported failure in its payload.
    #[error("{0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Remote call logic of one paste site.
#[async_trait]
pub trait PasteService: Send + Sync {
    /// Create a paste and return its public URL.
    async fn create(
        &self,
        filename: &str,
        contents: &str,
    ) -> std::result::Result<String, ServiceError>;
}

/// A paste site as the orchestrator sees it.
pub struct PasteDestination {
    name: String,
    max_size_bytes: u64,
    preferred: Vec<Regex>,
    service: Arc<dyn PasteService>,
}

impl PasteDestination {
    pub fn new(
        name: impl Into<String>,
        max_size_bytes: u64,
        service: Arc<dyn PasteService>,
    ) -> Self {
        Self {
            name: name.into(),
            max_size_bytes,
            preferred: Vec::new(),
            service,
        }
    }

    /// Filename patterns this site should win for. Each must match the whole name.
    pub fn with_patterns(mut self, patterns: &[&str]) -> Result<Self> {
        for p in patterns {
            self.preferred.push(Regex::new(&format!("^(?:{p})$"))?);
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Human-readable ceiling in MB, e.g. `"0.5"`.
    pub fn max_size_text(&self) -> String {
        bytes_to_megabytes_text(self.max_size_bytes)
    }

    pub fn prefers(&self, filename: &str) -> bool {
        self.preferred.iter().any(|re| re.is_match(filename))
    }

    /// Submit one file. Failures come back as data for that file's result entry.
    pub async fn submit(
        &self,
        filename: &str,
        contents: &str,
    ) -> std::result::Result<String, FileError> {
        info!(
            site = %self.name,
            filename,
            chars = contents.chars().count(),
            "creating paste"
        );
        match self.service.create(filename, contents).await {
            Ok(url) => {
                info!(site = %self.name, filename, %url, "created paste");
                Ok(url)
            }
            Err(e) => {
                warn!(site = %self.name, filename, error = %e, "failed to create paste");
                Err(FileError::Upload {
                    destination: self.name.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for PasteDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasteDestination")
            .field("name", &self.name)
            .field("max_size_bytes", &self.max_size_bytes)
            .field(
                "preferred",
                &self.preferred.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Destinations in priority order plus the fallback.
#[derive(Debug)]
pub struct DestinationRegistry {
    destinations: Vec<Arc<PasteDestination>>,
    default_idx: usize,
}

impl DestinationRegistry {
    pub fn new(destinations: Vec<PasteDestination>, default_name: &str) -> Result<Self> {
        let default_idx = destinations
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(default_name))
            .ok_or_else(|| {
                Error::Config(format!("unknown default paste site: {default_name}"))
            })?;
        Ok(Self {
            destinations: destinations.into_iter().map(Arc::new).collect(),
            default_idx,
        })
    }

    pub fn all(&self) -> &[Arc<PasteDestination>] {
        &self.destinations
    }

    pub fn default_destination(&self) -> Arc<PasteDestination> {
        Arc::clone(&self.destinations[self.default_idx])
    }

    /// Priority index of the first destination whose patterns match `filename`.
    fn preferred_index(&self, filename: &str) -> Option<usize> {
        self.destinations.iter().position(|d| d.prefers(filename))
    }

    /// The most preferred destination across all filenames, else the default.
    pub fn preferred_for<'a>(
        &self,
        filenames: impl IntoIterator<Item = &'a str>,
    ) -> Arc<PasteDestination> {
        filenames
            .into_iter()
            .filter_map(|f| self.preferred_index(f))
            .min()
            .map(|idx| Arc::clone(&self.destinations[idx]))
            .unwrap_or_else(|| self.default_destination())
    }
}
