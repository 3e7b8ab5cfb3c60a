use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a retriever while fetching children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverError {
    pub kind: RetrieverErrorKind,
    pub message: Option<String>,
}

impl RetrieverError {
    pub fn new(kind: RetrieverErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: Some(message.into()) }
    }

    pub fn simple(kind: RetrieverErrorKind) -> Self {
        Self { kind, message: None }
    }
}

impl Display for RetrieverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl Error for RetrieverError {}

/// Categorises retriever failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverErrorKind {
    /// The backing service could not be reached.
    Unavailable,
    /// The node or paging window is not known to the retriever.
    InvalidArgument,
    Failed,
}
