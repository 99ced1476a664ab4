use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JournalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Terms of use have not been accepted")]
    Consent,

    #[error("Assistant platform error: {0}")]
    Upstream(String),

    #[error("Assistant run did not complete after {attempts} status checks ({waited_ms}ms)")]
    TimedOut { attempts: u32, waited_ms: u64 },

    #[error("Input normalisation error: {0}")]
    Normalizer(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

/// User-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty input; the user corrects it and resubmits.
    Validation,
    /// The assistant platform failed or timed out.
    Upstream,
    /// Text could not be extracted from an attachment.
    Normalizer,
    /// Submission attempted without accepting the terms.
    Consent,
    /// Everything else (storage, export, interop).
    Internal,
}

impl JournalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JournalError::Validation(_) => ErrorKind::Validation,
            JournalError::Consent => ErrorKind::Consent,
            JournalError::Upstream(_)
            | JournalError::TimedOut { .. }
            | JournalError::Network(_) => ErrorKind::Upstream,
            JournalError::Normalizer(_) => ErrorKind::Normalizer,
            _ => ErrorKind::Internal,
        }
    }

    /// Status code the proxy endpoint answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Serialization(e.to_string())
    }
}
