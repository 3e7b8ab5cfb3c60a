//! In-memory retriever over a static tree, used by the runtime and CLI tests.

mod retriever;
mod tree;

pub use retriever::{MockRetriever, RetrieverCall};
pub use tree::{
    DEFAULT_CHILDREN_KEY, DEFAULT_LABEL_KEY, MockItem, MockTreeLoadError, NodeSpec, StaticTree,
};

#[cfg(test)]
mod tests;
