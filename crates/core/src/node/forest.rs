use super::data::NodeData;
use super::identifiers::NodeId;
use super::tree_node::TreeNode;
use crate::TreeError;

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    node: Option<TreeNode<T>>,
}

/// Arena holding every materialised node of the tree view.
///
/// A forest has any number of roots. Nodes live until their subtree is reset;
/// freed slots are recycled with a bumped generation.
#[derive(Clone, Debug)]
pub struct Forest<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    roots: Vec<NodeId>,
    live: usize,
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free_list: Vec::new(), roots: Vec::new(), live: 0 }
    }

    pub fn with_roots(roots: impl IntoIterator<Item = NodeData<T>>) -> Self {
        let mut forest = Self::new();
        for data in roots {
            forest.add_root(data);
        }
        forest
    }

    pub fn add_root(&mut self, data: NodeData<T>) -> NodeId {
        let id = self.allocate(TreeNode::new(data, None, 0));
        self.roots.push(id);
        id
    }

    #[allow(clippy::cast_possible_truncation)]
    fn allocate(&mut self, node: TreeNode<T>) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeId::new(index, 0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn release(&mut self, id: NodeId) -> Option<TreeNode<T>> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index() as u32);
        self.live -= 1;
        Some(node)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<T>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<T>> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode<T>, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode<T>, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent()
    }

    /// Children of `id`; empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    /// Materialises `items` as new trailing children of `parent`, keeping
    /// their order.
    pub fn append_children(
        &mut self,
        parent: NodeId,
        items: impl IntoIterator<Item = NodeData<T>>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let depth = self.node(parent)?.depth() + 1;
        let mut added = Vec::new();
        for data in items {
            let child = self.allocate(TreeNode::new(data, Some(parent), depth));
            added.push(child);
        }
        let node = self.node_mut(parent)?;
        for child in &added {
            node.push_child(*child);
        }
        Ok(added)
    }

    /// Collapses `id`, rewinds its paging cursor and frees every descendant.
    /// Returns the number of freed nodes.
    pub fn reset_subtree(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let mut stack = self.node_mut(id)?.reset();
        let mut freed = 0;
        while let Some(child) = stack.pop() {
            if let Some(mut node) = self.release(child) {
                stack.append(&mut node.reset());
                freed += 1;
            }
        }
        Ok(freed)
    }

    /// Walks the parent chain of `id`, nearest ancestor first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors { forest: self, next: self.parent(id) }
    }

    /// Whether `candidate` lies strictly below `ancestor`. Costs O(depth).
    pub fn is_descendant(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(candidate).any(|id| id == ancestor)
    }

    /// Hierarchical level computed from the parent chain.
    pub fn level(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// True if every ancestor of `id` is expanded.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.contains(id)
            && self
                .ancestors(id)
                .all(|ancestor| self.get(ancestor).is_some_and(TreeNode::is_expanded))
    }

    /// Live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode<T>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            let id = NodeId::new(index as u32, slot.generation);
            slot.node.as_ref().map(|node| (id, node))
        })
    }
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.forest.parent(current);
        Some(current)
    }
}
