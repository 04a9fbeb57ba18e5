use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unauthorized - token may be expired or revoked")]
    Unauthorized,

    #[error("Request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// The two failure classes callers distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request failed or the server answered with a non-success status
    Network,
    /// Body did not have the expected shape
    Decode,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => FetchError::Unauthorized,
            _ => FetchError::Status {
                status,
                body: Self::truncate_body(body),
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Decode(_) => FailureKind::Decode,
            FetchError::Unauthorized | FetchError::Status { .. } | FetchError::Network(_) => {
                FailureKind::Network
            }
        }
    }

    /// The server rejected the credential itself.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized)
    }
}
