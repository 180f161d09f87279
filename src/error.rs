use std::time::Duration;
use thiserror::Error;

/// Errors produced by the relay pipeline.
///
/// Every variant maps onto exactly one of the five envelope failure codes
/// via [`RelayError::kind`]. Transport-level variants (`Request`, `Http`,
/// `Timeout`, `Other`) all collapse to the `error` kind.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Standard input was empty or not parseable as a job object.
    #[error("{0}")]
    Input(String),

    /// A request parameter was missing or malformed.
    #[error("{0}")]
    Params(String),

    /// No usable API key could be resolved from the environment.
    #[error("{0}")]
    Env(String),

    /// The caller demanded JSON but the model returned none (or invalid JSON).
    #[error("{0}")]
    Json(String),

    /// Low-level HTTP transport failure (connection refused, DNS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code (e.g. 401, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The generation request did not settle before the deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Catch-all for other failures.
    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// The envelope failure code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Input(_) => "input",
            RelayError::Params(_) => "params",
            RelayError::Env(_) => "env",
            RelayError::Json(_) => "json",
            RelayError::Request(_)
            | RelayError::Http { .. }
            | RelayError::Timeout(_)
            | RelayError::Other(_) => "error",
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
