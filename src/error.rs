use thiserror::Error;

/// Failure of a single control operation, terminated at the UI boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    /// A required field was empty; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// The backend answered with an `error` field.
    #[error("{0}")]
    Application(String),
    /// Network, HTTP or decoding failure.
    #[error("Request failed: {0}")]
    Transport(String),
}

impl ControlError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn user_text(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for ControlError {
    fn from(error: reqwest::Error) -> Self {
        let detail = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            format!("could not connect to backend ({error})")
        } else {
            error.to_string()
        };
        Self::Transport(detail)
    }
}
