//! Contract between the tree view and the application that supplies its data.
//!
//! Retrievers hand out `'static` futures so a fetch can be awaited while the
//! tree keeps handling other events. Nothing here requires `Send`: the view
//! lives on a single UI thread.

mod error;

pub use error::{RetrieverError, RetrieverErrorKind};

use crate::TreeError;
use crate::node::NodeData;
use crate::paging::PagingParams;
use futures_lite::future::{self, BoxedLocal};
use std::sync::Arc;

pub type RetrieverFuture<R> = BoxedLocal<Result<R, RetrieverError>>;

/// Wraps an already known result into a [`RetrieverFuture`].
pub fn ready<R: 'static>(result: Result<R, RetrieverError>) -> RetrieverFuture<R> {
    Box::pin(future::ready(result))
}

/// Fetches all children of a node in one go.
pub trait TreeNodeRetriever<T> {
    fn has_children(&self, node: &NodeData<T>) -> RetrieverFuture<bool>;
    fn get_children(&self, node: &NodeData<T>) -> RetrieverFuture<Vec<NodeData<T>>>;
}

/// Fetches children page by page.
pub trait PagedTreeNodeRetriever<T>: TreeNodeRetriever<T> {
    fn get_paged_children(
        &self,
        node: &NodeData<T>,
        paging: PagingParams,
    ) -> RetrieverFuture<Vec<NodeData<T>>>;

    fn get_child_count(&self, node: &NodeData<T>) -> RetrieverFuture<usize>;
}

/// The retriever a tree view was configured with.
pub enum Retriever<T> {
    Basic(Arc<dyn TreeNodeRetriever<T>>),
    Paged(Arc<dyn PagedTreeNodeRetriever<T>>),
}

impl<T> Retriever<T> {
    pub fn is_paged(&self) -> bool {
        matches!(self, Retriever::Paged(_))
    }

    pub fn has_children(&self, node: &NodeData<T>) -> RetrieverFuture<bool> {
        match self {
            Retriever::Basic(retriever) => retriever.has_children(node),
            Retriever::Paged(retriever) => retriever.has_children(node),
        }
    }

    /// Fetches one page for paged retrievers or the whole child list otherwise.
    /// `paging` is ignored by basic retrievers.
    pub fn fetch(
        &self,
        node: &NodeData<T>,
        paging: Option<PagingParams>,
    ) -> RetrieverFuture<Vec<NodeData<T>>> {
        match (self, paging) {
            (Retriever::Paged(retriever), Some(paging)) => {
                retriever.get_paged_children(node, paging)
            }
            (Retriever::Paged(retriever), None) => retriever.get_children(node),
            (Retriever::Basic(retriever), _) => retriever.get_children(node),
        }
    }

    pub fn child_count(&self, node: &NodeData<T>) -> Result<RetrieverFuture<usize>, TreeError> {
        match self {
            Retriever::Paged(retriever) => Ok(retriever.get_child_count(node)),
            Retriever::Basic(_) => Err(TreeError::NotPaged),
        }
    }
}

impl<T> Clone for Retriever<T> {
    fn clone(&self) -> Self {
        match self {
            Retriever::Basic(retriever) => Retriever::Basic(Arc::clone(retriever)),
            Retriever::Paged(retriever) => Retriever::Paged(Arc::clone(retriever)),
        }
    }
}

impl<T> std::fmt::Debug for Retriever<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Retriever::Basic(_) => f.write_str("Retriever::Basic"),
            Retriever::Paged(_) => f.write_str("Retriever::Paged"),
        }
    }
}
