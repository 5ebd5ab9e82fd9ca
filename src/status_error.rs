use std::fmt;

use http::StatusCode;

use crate::error::Error;

/// Handler-level error: a status code plus an optional short body.
///
/// When the brief is empty, the response body falls back to the status'
/// canonical reason.
#[derive(Debug)]
pub struct StatusError {
    pub code: StatusCode,
    pub brief: String,
}

impl StatusError {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            brief: String::new(),
        }
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attach a short, user-visible body.
    pub fn brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.brief.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.brief)
        }
    }
}

impl std::error::Error for StatusError {}

// Internal failures while writing a response never leak detail to the client.
impl From<Error> for StatusError {
    fn from(_: Error) -> Self {
        StatusError::internal_server_error()
    }
}
