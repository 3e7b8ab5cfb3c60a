use super::data::{NodeData, NodeLabel};
use super::identifiers::NodeId;
use std::borrow::Cow;

bitflags::bitflags! {
    /// View state carried by every node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        const SELECTED = 1 << 0;
        const EXPANDED = 1 << 1;
        const ALL_CHILDREN_LOADED = 1 << 2;
        const SHOW_LOADER = 1 << 3;
        const LOAD_ERROR = 1 << 4;
    }
}

/// Fetch lifecycle of a node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// One node of the forest. Children and parent are arena handles; the parent
/// link never owns anything.
#[derive(Clone, Debug)]
pub struct TreeNode<T> {
    data: NodeData<T>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    flags: NodeFlags,
    has_children: Option<bool>,
    expected_children: Option<usize>,
    pending: Option<usize>,
}

impl<T> TreeNode<T> {
    pub(crate) fn new(data: NodeData<T>, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            data,
            parent,
            children: Vec::new(),
            depth,
            flags: NodeFlags::empty(),
            has_children: None,
            expected_children: None,
            pending: None,
        }
    }

    pub fn data(&self) -> &NodeData<T> {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of ancestors; roots are at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(NodeFlags::SELECTED)
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.contains(NodeFlags::EXPANDED)
    }

    pub fn all_children_loaded(&self) -> bool {
        self.flags.contains(NodeFlags::ALL_CHILDREN_LOADED)
    }

    pub fn show_loader(&self) -> bool {
        self.flags.contains(NodeFlags::SHOW_LOADER)
    }

    pub fn load_error(&self) -> bool {
        self.flags.contains(NodeFlags::LOAD_ERROR)
    }

    /// Result of the last `has_children` probe, `None` until probed.
    pub fn has_children(&self) -> Option<bool> {
        self.has_children
    }

    pub fn expected_children(&self) -> Option<usize> {
        self.expected_children
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn load_state(&self) -> LoadState {
        if self.pending.is_some() {
            LoadState::Loading
        } else if self.load_error() {
            LoadState::Error
        } else if !self.children.is_empty() || self.all_children_loaded() {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }

    /// Whether the expand affordance should be offered.
    pub fn is_expandable(&self) -> bool {
        self.has_children != Some(false)
    }

    /// Marks the node expanded. Returns `false` if it already was.
    pub fn expand(&mut self) -> bool {
        if self.is_expanded() {
            return false;
        }
        self.flags.insert(NodeFlags::EXPANDED);
        if self.pending.is_some() {
            self.flags.insert(NodeFlags::SHOW_LOADER);
        }
        true
    }

    /// Marks the node collapsed and clears the transient flags. A fetch that is
    /// still in flight stays registered so its page lands in the cache.
    pub fn collapse(&mut self) -> bool {
        let changed = self.is_expanded();
        self.flags.remove(NodeFlags::EXPANDED | NodeFlags::SHOW_LOADER | NodeFlags::LOAD_ERROR);
        changed
    }

    /// Registers a fetch starting at the current child count. Returns `None`
    /// while another fetch is in flight or once every child is loaded.
    pub fn begin_load(&mut self) -> Option<usize> {
        if self.pending.is_some() || self.all_children_loaded() {
            return None;
        }
        let offset = self.children.len();
        self.pending = Some(offset);
        self.flags.remove(NodeFlags::LOAD_ERROR);
        self.flags.insert(NodeFlags::SHOW_LOADER);
        Some(offset)
    }

    /// True if a completion for `offset` is what this node is waiting for.
    pub fn is_expecting(&self, offset: usize) -> bool {
        self.pending == Some(offset)
    }

    pub fn finish_load(&mut self) {
        self.pending = None;
        self.flags.remove(NodeFlags::SHOW_LOADER | NodeFlags::LOAD_ERROR);
    }

    pub fn fail_load(&mut self) {
        self.pending = None;
        self.flags.remove(NodeFlags::SHOW_LOADER);
        self.flags.insert(NodeFlags::LOAD_ERROR);
    }

    /// Exhaustion is sticky; only [`Forest::reset_subtree`](super::Forest::reset_subtree) clears it.
    pub fn mark_all_children_loaded(&mut self) {
        self.flags.insert(NodeFlags::ALL_CHILDREN_LOADED);
    }

    pub fn set_has_children(&mut self, has_children: bool) {
        self.has_children = Some(has_children);
    }

    pub fn set_expected_children(&mut self, count: usize) {
        self.expected_children = Some(count);
        if self.children.len() >= count {
            self.mark_all_children_loaded();
        }
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.flags.set(NodeFlags::SELECTED, selected);
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Drops the paging cursor and every cached child handle.
    pub(crate) fn reset(&mut self) -> Vec<NodeId> {
        self.pending = None;
        self.expected_children = None;
        self.flags.remove(
            NodeFlags::EXPANDED
                | NodeFlags::ALL_CHILDREN_LOADED
                | NodeFlags::SHOW_LOADER
                | NodeFlags::LOAD_ERROR,
        );
        std::mem::take(&mut self.children)
    }
}

impl<T: NodeLabel> TreeNode<T> {
    pub fn label(&self) -> Cow<'_, str> {
        self.data.label()
    }
}
