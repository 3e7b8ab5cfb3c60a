use crate::error::TreeError;
use crate::node::{Forest, NodeId};

/// Single-selection state. The selected flag on the node and the id stored
/// here always agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Selects `id`, deselecting the previous node. Returns the previously
    /// selected node if it was a different one.
    pub fn select<T>(
        &mut self,
        forest: &mut Forest<T>,
        id: NodeId,
    ) -> Result<Option<NodeId>, TreeError> {
        forest.node(id)?;
        let previous = self.selected.replace(id).filter(|previous| *previous != id);
        if let Some(node) = previous.and_then(|previous| forest.get_mut(previous)) {
            node.set_selected(false);
        }
        forest.node_mut(id)?.set_selected(true);
        Ok(previous)
    }

    pub fn clear<T>(&mut self, forest: &mut Forest<T>) -> Option<NodeId> {
        let previous = self.selected.take()?;
        if let Some(node) = forest.get_mut(previous) {
            node.set_selected(false);
        }
        Some(previous)
    }
}
