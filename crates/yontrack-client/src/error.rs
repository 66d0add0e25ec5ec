use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server could not be reached. These are the only retried errors.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status} {message}")]
    Http { status: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors listed at the top level of the GraphQL response.
    #[error("{0}")]
    GraphQL(ErrorList),

    /// Errors listed in a mutation payload.
    #[error("{0}")]
    Payload(ErrorList),

    #[error("{0}")]
    Input(String),
}

/// One entry of a GraphQL `errors` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub message: String,
}

impl GraphError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Messages rendered as a numbered list, one per line: `1) first\n2) second\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorList(Vec<String>);

impl ErrorList {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl From<&[GraphError]> for ErrorList {
    fn from(errors: &[GraphError]) -> Self {
        Self(errors.iter().map(|e| e.message.clone()).collect())
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, message) in self.0.iter().enumerate() {
            writeln!(f, "{}) {}", index + 1, message)?;
        }
        Ok(())
    }
}

/// Aggregates the errors of a mutation payload.
///
/// Returns `Ok` for an empty list, otherwise a single [`ClientError::Payload`]
/// whose text numbers every message.
///
/// ```
/// use yontrack_client::{GraphError, check_data_errors};
///
/// assert!(check_data_errors(&[]).is_ok());
///
/// let err = check_data_errors(&[GraphError::new("Build not found"), GraphError::new("Denied")])
///     .unwrap_err();
/// assert_eq!(err.to_string(), "1) Build not found\n2) Denied\n");
/// ```
pub fn check_data_errors(errors: &[GraphError]) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Payload(ErrorList::from(errors)))
    }
}
