//! Flat, depth-first pre-order list of the rows a virtual scroller displays.

use crate::node::{Forest, NodeId};
use serde::{Deserialize, Serialize};

/// Window of row indices reported by the virtual scroller; `end` is exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub start: usize,
    pub end: usize,
}

impl Viewport {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Visible rows of a forest.
///
/// Built once from the roots and then patched on every expand, collapse and
/// child insertion. A patch only touches the rows of the affected subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleRows {
    rows: Vec<NodeId>,
}

impl VisibleRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full walk from the roots.
    pub fn rebuild<T>(forest: &Forest<T>) -> Self {
        let mut rows = Vec::new();
        for root in forest.roots() {
            push_visible(forest, *root, &mut rows);
        }
        Self { rows }
    }

    pub fn produce(&self) -> &[NodeId] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.rows.get(index).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.rows.iter().position(|row| *row == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.rows.contains(&id)
    }

    /// Rows inside `viewport`, clamped to the list.
    pub fn window(&self, viewport: Viewport) -> &[NodeId] {
        let end = viewport.end.min(self.rows.len());
        let start = viewport.start.min(end);
        &self.rows[start..end]
    }

    /// Splices the visible subtree of a freshly expanded node in after it.
    /// Returns the number of inserted rows.
    pub fn on_expanded<T>(&mut self, forest: &Forest<T>, id: NodeId) -> usize {
        let Some(position) = self.position(id) else {
            return 0;
        };
        if !forest.get(id).is_some_and(|node| node.is_expanded()) {
            return 0;
        }
        let end = self.subtree_end(forest, position);
        let mut inserted = Vec::new();
        for child in forest.children(id) {
            push_visible(forest, *child, &mut inserted);
        }
        let count = inserted.len();
        self.rows.splice(position + 1..end, inserted);
        count
    }

    /// Removes the rows below a collapsed node. Returns the number removed.
    pub fn on_collapsed<T>(&mut self, forest: &Forest<T>, id: NodeId) -> usize {
        let Some(position) = self.position(id) else {
            return 0;
        };
        let end = self.subtree_end(forest, position);
        self.rows.drain(position + 1..end);
        end - position - 1
    }

    /// Inserts new trailing children of `parent` after its last visible
    /// descendant. Nothing changes if `parent` is hidden or collapsed.
    pub fn on_children_appended<T>(
        &mut self,
        forest: &Forest<T>,
        parent: NodeId,
        added: &[NodeId],
    ) -> usize {
        if !forest.get(parent).is_some_and(|node| node.is_expanded()) {
            return 0;
        }
        let Some(position) = self.position(parent) else {
            return 0;
        };
        let end = self.subtree_end(forest, position);
        let mut inserted = Vec::new();
        for child in added {
            push_visible(forest, *child, &mut inserted);
        }
        let count = inserted.len();
        self.rows.splice(end..end, inserted);
        count
    }

    /// Index one past the contiguous run of descendants following `position`.
    fn subtree_end<T>(&self, forest: &Forest<T>, position: usize) -> usize {
        let node = self.rows[position];
        let mut end = position + 1;
        while end < self.rows.len() && forest.is_descendant(self.rows[end], node) {
            end += 1;
        }
        end
    }
}

fn push_visible<T>(forest: &Forest<T>, id: NodeId, out: &mut Vec<NodeId>) {
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        let Some(node) = forest.get(current) else {
            continue;
        };
        out.push(current);
        if node.is_expanded() {
            stack.extend(node.children().iter().rev().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;
    use rstest::{fixture, rstest};

    fn data(label: &str) -> NodeData<String> {
        NodeData::new(label.to_owned(), "name")
    }

    struct Foods {
        forest: Forest<String>,
        foods: NodeId,
        fruit: NodeId,
        vegetables: NodeId,
        apple: NodeId,
        banana: NodeId,
        carrot: NodeId,
    }

    #[fixture]
    fn foods() -> Foods {
        let mut forest = Forest::new();
        let foods = forest.add_root(data("Foods"));
        let level1 = forest.append_children(foods, [data("Fruit"), data("Vegetables")]).unwrap();
        let fruit_children =
            forest.append_children(level1[0], [data("Apple"), data("Banana")]).unwrap();
        let vegetable_children = forest.append_children(level1[1], [data("Carrot")]).unwrap();
        Foods {
            forest,
            foods,
            fruit: level1[0],
            vegetables: level1[1],
            apple: fruit_children[0],
            banana: fruit_children[1],
            carrot: vegetable_children[0],
        }
    }

    fn expand(tree: &mut Foods, rows: &mut VisibleRows, id: NodeId) {
        tree.forest.node_mut(id).unwrap().expand();
        rows.on_expanded(&tree.forest, id);
    }

    fn collapse(tree: &mut Foods, rows: &mut VisibleRows, id: NodeId) {
        tree.forest.node_mut(id).unwrap().collapse();
        rows.on_collapsed(&tree.forest, id);
    }

    #[rstest]
    fn collapsed_roots_show_only_themselves(foods: Foods) {
        let rows = VisibleRows::rebuild(&foods.forest);
        assert_eq!(rows.produce(), &[foods.foods]);
    }

    #[rstest]
    fn expansion_is_depth_first_pre_order(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let (root, fruit, vegetables) = (foods.foods, foods.fruit, foods.vegetables);
        expand(&mut foods, &mut rows, root);
        expand(&mut foods, &mut rows, vegetables);
        expand(&mut foods, &mut rows, fruit);

        assert_eq!(
            rows.produce(),
            &[foods.foods, foods.fruit, foods.apple, foods.banana, foods.vegetables, foods.carrot]
        );
        assert_eq!(rows, VisibleRows::rebuild(&foods.forest));
    }

    #[rstest]
    fn collapse_hides_whole_subtree_but_keeps_child_state(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let (root, fruit) = (foods.foods, foods.fruit);
        expand(&mut foods, &mut rows, root);
        expand(&mut foods, &mut rows, fruit);

        collapse(&mut foods, &mut rows, root);
        assert_eq!(rows.produce(), &[foods.foods]);
        assert!(foods.forest.node(foods.fruit).unwrap().is_expanded());

        expand(&mut foods, &mut rows, root);
        assert_eq!(
            rows.produce(),
            &[foods.foods, foods.fruit, foods.apple, foods.banana, foods.vegetables]
        );
        assert_eq!(rows, VisibleRows::rebuild(&foods.forest));
    }

    #[rstest]
    fn collapsing_twice_is_harmless(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let (root, fruit) = (foods.foods, foods.fruit);
        expand(&mut foods, &mut rows, root);
        expand(&mut foods, &mut rows, fruit);
        collapse(&mut foods, &mut rows, fruit);
        collapse(&mut foods, &mut rows, fruit);
        assert_eq!(rows.produce(), &[foods.foods, foods.fruit, foods.vegetables]);
    }

    #[rstest]
    fn expanding_hidden_node_changes_nothing(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let fruit = foods.fruit;
        expand(&mut foods, &mut rows, fruit);
        assert_eq!(rows.produce(), &[foods.foods]);
    }

    #[rstest]
    fn appended_children_land_after_last_descendant(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let (root, fruit) = (foods.foods, foods.fruit);
        expand(&mut foods, &mut rows, root);
        expand(&mut foods, &mut rows, fruit);

        let added = foods.forest.append_children(foods.foods, [data("Grain")]).unwrap();
        assert_eq!(rows.on_children_appended(&foods.forest, foods.foods, &added), 1);
        assert_eq!(rows.get(rows.len() - 1), Some(added[0]));

        let more = foods.forest.append_children(foods.fruit, [data("Cherry")]).unwrap();
        rows.on_children_appended(&foods.forest, foods.fruit, &more);
        assert_eq!(rows.position(more[0]), Some(4));
        assert_eq!(rows, VisibleRows::rebuild(&foods.forest));
    }

    #[rstest]
    fn appending_to_collapsed_parent_is_ignored(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let added = foods.forest.append_children(foods.vegetables, [data("Leek")]).unwrap();
        assert_eq!(rows.on_children_appended(&foods.forest, foods.vegetables, &added), 0);
        assert_eq!(rows.len(), 1);
    }

    #[rstest]
    fn no_row_has_a_collapsed_ancestor(mut foods: Foods) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let (root, fruit, vegetables) = (foods.foods, foods.fruit, foods.vegetables);
        expand(&mut foods, &mut rows, root);
        expand(&mut foods, &mut rows, fruit);
        expand(&mut foods, &mut rows, vegetables);
        collapse(&mut foods, &mut rows, fruit);

        for row in rows.produce() {
            assert!(foods.forest.is_reachable(*row), "row {row} has a collapsed ancestor");
        }
        assert!(!rows.contains(foods.banana));
        assert!(rows.contains(foods.carrot));
    }

    #[rstest]
    #[case(Viewport::new(0, 2), 2)]
    #[case(Viewport::new(1, 10), 2)]
    #[case(Viewport::new(5, 9), 0)]
    fn window_is_clamped(mut foods: Foods, #[case] viewport: Viewport, #[case] expected: usize) {
        let mut rows = VisibleRows::rebuild(&foods.forest);
        let root = foods.foods;
        expand(&mut foods, &mut rows, root);
        assert_eq!(rows.window(viewport).len(), expected);
    }
}
