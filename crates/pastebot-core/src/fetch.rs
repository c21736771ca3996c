//! Attachment retrieval: download via the platform port, then gunzip `.gz` files.

use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;

use crate::{domain::Attachment, FileError, Result};

const FILE_EXT_GZIP: &str = ".gz";

/// Platform-specific download of an attachment's raw bytes.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn fetch_bytes(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}

/// Fetch an attachment as text, decompressing gzip payloads.
///
/// Anything larger than `limit` bytes once decompressed is reported as oversized
/// instead of being returned.
pub async fn fetch_contents(
    source: &dyn AttachmentSource,
    attachment: &Attachment,
    limit: u64,
) -> std::result::Result<String, FileError> {
    let raw = source.fetch_bytes(attachment).await?;
    let bytes = if attachment.filename.ends_with(FILE_EXT_GZIP) {
        gunzip_bounded(&raw, limit)?
    } else {
        raw
    };
    if bytes.len() as u64 > limit {
        return Err(FileError::Oversized { limit });
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decompress at most `limit + 1` bytes; one byte past the limit is enough to know it is too big.
fn gunzip_bounded(raw: &[u8], limit: u64) -> std::result::Result<Vec<u8>, FileError> {
    let mut out = Vec::new();
    GzDecoder::new(raw)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| FileError::Transport(format!("failed to decompress: {e}")))?;
    Ok(out)
}
