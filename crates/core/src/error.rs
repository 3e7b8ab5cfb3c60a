use crate::node::NodeId;
use crate::retriever::RetrieverError;
use thiserror::Error;

/// Errors raised by tree operations. All of them are scoped to a single node;
/// the rest of the forest stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} reported no children and cannot be expanded")]
    NotExpandable(NodeId),
    #[error("paging limit must be positive (offset {offset})")]
    InvalidPaging { offset: usize },
    #[error("retriever does not support paging")]
    NotPaged,
    #[error(transparent)]
    Retriever(#[from] RetrieverError),
}
