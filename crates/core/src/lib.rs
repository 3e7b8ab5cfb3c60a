//! Framework independent model of a lazily loaded tree view: the node arena,
//! the retriever contract, the flattened row list and the selection state.

pub mod config;
mod error;
pub mod event;
pub mod flatten;
pub mod node;
pub mod paging;
pub mod retriever;
pub mod selection;

pub use config::{ColorTheme, TreeViewConfig};
pub use error::TreeError;
pub use event::{TreeViewEvent, TreeViewEventKind, TreeViewEventSink};
pub use flatten::{Viewport, VisibleRows};
pub use node::{Forest, LoadState, NodeData, NodeId, NodeLabel, TreeNode};
pub use paging::PagingParams;
pub use retriever::{
    PagedTreeNodeRetriever, Retriever, RetrieverError, RetrieverErrorKind, RetrieverFuture,
    TreeNodeRetriever,
};
pub use selection::Selection;
