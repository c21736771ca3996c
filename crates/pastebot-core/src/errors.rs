/// Core error type for the paste bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single file within an upload batch.
///
/// These never abort the batch; they are rendered into that file's reply block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("{0}")]
    Transport(String),

    #[error("file contents exceed the {limit} byte limit")]
    Oversized { limit: u64 },

    #[error("{destination} - {message}")]
    Upload {
        destination: String,
        message: String,
    },

    #[error("{0}")]
    Task(String),
}

impl FileError {
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::Transport(_) => "TransportError",
            FileError::Oversized { .. } => "FileTooLarge",
            FileError::Upload { .. } => "UploadError",
            FileError::Task(_) => "TaskError",
        }
    }

    /// `"<Kind>: <message>"`, the form shown to users.
    pub fn describe(&self) -> String {
        format!("{}: {self}", self.kind())
    }
}

impl From<Error> for FileError {
    fn from(e: Error) -> Self {
        FileError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_upload_failures_with_kind_prefix() {
        let e = FileError::Upload {
            destination: "paste.gg".to_string(),
            message: "400 Bad Request".to_string(),
        };
        assert_eq!(e.describe(), "UploadError: paste.gg - 400 Bad Request");
    }

    #[test]
    fn transport_errors_keep_their_message() {
        let e: FileError = Error::External("connection reset".to_string()).into();
        assert_eq!(
            e.describe(),
            "TransportError: external error: connection reset"
        );
    }
}
