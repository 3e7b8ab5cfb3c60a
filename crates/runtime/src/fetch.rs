use lazytree_core::node::{NodeData, NodeId};
use lazytree_core::paging::PagingParams;
use lazytree_core::retriever::{RetrieverError, RetrieverFuture};
use std::fmt;
use std::time::{Duration, Instant};

/// What triggered a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchPurpose {
    Expand,
    Scroll,
}

/// An in-flight retriever call. Await [`PendingFetch::resolve`] and hand the
/// outcome back to [`TreeView::complete`](crate::TreeView::complete).
pub struct PendingFetch<T> {
    pub(crate) node: NodeId,
    pub(crate) ticket: u64,
    pub(crate) purpose: FetchPurpose,
    pub(crate) offset: usize,
    pub(crate) paging: Option<PagingParams>,
    pub(crate) started: Instant,
    pub(crate) future: RetrieverFuture<Vec<NodeData<T>>>,
}

impl<T> PendingFetch<T> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn purpose(&self) -> FetchPurpose {
        self.purpose
    }

    /// Requested page, `None` for retrievers without paging.
    pub fn paging(&self) -> Option<PagingParams> {
        self.paging
    }

    pub async fn resolve(self) -> FetchOutcome<T> {
        let result = self.future.await;
        FetchOutcome {
            node: self.node,
            ticket: self.ticket,
            purpose: self.purpose,
            offset: self.offset,
            paging: self.paging,
            result,
            elapsed: self.started.elapsed(),
        }
    }
}

impl<T> fmt::Debug for PendingFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("node", &self.node)
            .field("ticket", &self.ticket)
            .field("purpose", &self.purpose)
            .field("offset", &self.offset)
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}

/// Result of a resolved fetch, not yet applied to the tree.
pub struct FetchOutcome<T> {
    pub(crate) node: NodeId,
    pub(crate) ticket: u64,
    pub(crate) purpose: FetchPurpose,
    pub(crate) offset: usize,
    pub(crate) paging: Option<PagingParams>,
    pub(crate) result: Result<Vec<NodeData<T>>, RetrieverError>,
    pub(crate) elapsed: Duration,
}

impl<T> FetchOutcome<T> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn purpose(&self) -> FetchPurpose {
        self.purpose
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<T> fmt::Debug for FetchOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOutcome")
            .field("node", &self.node)
            .field("ticket", &self.ticket)
            .field("purpose", &self.purpose)
            .field("offset", &self.offset)
            .field("items", &self.result.as_ref().map(Vec::len))
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// How [`TreeView::complete`](crate::TreeView::complete) applied an outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchApplied {
    Appended { node: NodeId, fetched: usize, exhausted: bool },
    Failed { node: NodeId, error: RetrieverError },
    /// The node was reset, freed or is waiting for a different page.
    Stale { node: NodeId },
}

impl FetchApplied {
    pub fn node(&self) -> NodeId {
        match self {
            FetchApplied::Appended { node, .. }
            | FetchApplied::Failed { node, .. }
            | FetchApplied::Stale { node } => *node,
        }
    }

    pub fn fetched(&self) -> usize {
        match self {
            FetchApplied::Appended { fetched, .. } => *fetched,
            _ => 0,
        }
    }
}
