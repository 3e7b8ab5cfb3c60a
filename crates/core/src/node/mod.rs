mod data;
mod forest;
mod identifiers;
mod tree_node;

pub use data::{NodeData, NodeLabel};
pub use forest::{Ancestors, Forest};
pub use identifiers::NodeId;
pub use tree_node::{LoadState, NodeFlags, TreeNode};
