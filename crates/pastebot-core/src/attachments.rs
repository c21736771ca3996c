//! Attachment classification: size ceiling + content-type filtering.

use crate::domain::Attachment;

const MIME_TEXT: &str = "text/";
const MIME_JSON: &str = "application/json";

/// Result of partitioning a message's attachments for one destination.
///
/// `valid_type` is always a subset of `within_limit`; both keep input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub within_limit: Vec<Attachment>,
    pub valid_type: Vec<Attachment>,
}

impl Classification {
    /// Within-limit attachments whose content type looks wrong.
    pub fn invalid_type(&self) -> impl Iterator<Item = &Attachment> {
        self.within_limit
            .iter()
            .filter(|a| !self.valid_type.contains(a))
    }

    pub fn needs_confirmation(&self) -> bool {
        self.valid_type.len() < self.within_limit.len()
    }
}

pub fn is_valid_size(attachment: &Attachment, max_size_bytes: u64) -> bool {
    attachment.size_bytes <= max_size_bytes
}

pub fn is_valid_content_type(attachment: &Attachment) -> bool {
    if attachment.is_image {
        return false;
    }
    attachment
        .content_type
        .as_deref()
        .map(|ct| ct.starts_with(MIME_TEXT) || ct == MIME_JSON)
        .unwrap_or(false)
}

/// Whether the bot should advertise the upload marker for this file.
pub fn is_offerable(attachment: &Attachment, max_size_bytes: u64) -> bool {
    is_valid_content_type(attachment) && is_valid_size(attachment, max_size_bytes)
}

pub fn classify(attachments: &[Attachment], max_size_bytes: u64) -> Classification {
    let within_limit: Vec<Attachment> = attachments
        .iter()
        .filter(|a| is_valid_size(a, max_size_bytes))
        .cloned()
        .collect();
    let valid_type = within_limit
        .iter()
        .filter(|a| is_valid_content_type(a))
        .cloned()
        .collect();
    Classification {
        within_limit,
        valid_type,
    }
}

/// `'name' [type], ...` for log lines.
pub fn to_log_string(attachments: &[Attachment]) -> String {
    attachments
        .iter()
        .map(|a| {
            format!(
                "'{}' [{}]",
                a.filename,
                a.content_type.as_deref().unwrap_or("unknown")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn att(name: &str, size: u64, ct: Option<&str>, is_image: bool) -> Attachment {
        Attachment {
            id: name.to_string(),
            filename: name.to_string(),
            url: None,
            size_bytes: size,
            content_type: ct.map(|s| s.to_string()),
            is_image,
        }
    }

    #[test]
    fn size_limit_boundary_is_inclusive() {
        let limit = 1_000;
        assert!(is_valid_size(&att("a.txt", limit, None, false), limit));
        assert!(!is_valid_size(&att("a.txt", limit + 1, None, false), limit));
    }

    #[test]
    fn content_type_rules() {
        assert!(is_valid_content_type(&att("a", 1, Some("text/plain"), false)));
        assert!(is_valid_content_type(&att("a", 1, Some("text/x-log; charset=utf-8"), false)));
        assert!(is_valid_content_type(&att("a", 1, Some("application/json"), false)));
        assert!(!is_valid_content_type(&att("a", 1, Some("application/jsonl"), false)));
        assert!(!is_valid_content_type(&att("a", 1, Some("application/gzip"), false)));
        assert!(!is_valid_content_type(&att("a", 1, None, false)));
        // Images never count as text, whatever they claim.
        assert!(!is_valid_content_type(&att("a", 1, Some("text/plain"), true)));
    }

    #[test]
    fn partition_is_ordered_subset() {
        let input = vec![
            att("big.txt", 5_000, Some("text/plain"), false),
            att("one.txt", 10, Some("text/plain"), false),
            att("bin.dat", 10, Some("application/octet-stream"), false),
            att("two.json", 10, Some("application/json"), false),
            att("pic.png", 10, Some("image/png"), true),
        ];
        let c = classify(&input, 1_000);

        let within: Vec<_> = c.within_limit.iter().map(|a| a.filename.as_str()).collect();
        let valid: Vec<_> = c.valid_type.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(within, vec!["one.txt", "bin.dat", "two.json", "pic.png"]);
        assert_eq!(valid, vec!["one.txt", "two.json"]);
        assert!(c.valid_type.iter().all(|a| c.within_limit.contains(a)));

        let invalid: Vec<_> = c.invalid_type().map(|a| a.filename.as_str()).collect();
        assert_eq!(invalid, vec!["bin.dat", "pic.png"]);
        assert!(c.needs_confirmation());
    }

    #[test]
    fn all_valid_needs_no_confirmation() {
        let input = vec![att("a.log", 10, Some("text/plain"), false)];
        let c = classify(&input, 100);
        assert!(!c.needs_confirmation());
        assert_eq!(c.valid_type, c.within_limit);
    }

    #[test]
    fn offerable_requires_type_and_size() {
        assert!(is_offerable(&att("a", 10, Some("text/plain"), false), 10));
        assert!(!is_offerable(&att("a", 11, Some("text/plain"), false), 10));
        assert!(!is_offerable(&att("a", 10, Some("image/png"), true), 10));
    }
}
