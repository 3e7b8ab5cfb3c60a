use crate::node::NodeId;
use serde::Serialize;

/// Kind of state change announced by the tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreeViewEventKind {
    NodeClicked,
    NodeExpanded,
    NodeCollapsed,
    /// A fetch for the node completed and appended `count` children.
    ChildrenLoaded { count: usize },
    LoadFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TreeViewEvent {
    pub kind: TreeViewEventKind,
    pub node: NodeId,
}

impl TreeViewEvent {
    pub fn new(kind: TreeViewEventKind, node: NodeId) -> Self {
        Self { kind, node }
    }
}

/// Receives tree view events, e.g. a rendering layer.
pub trait TreeViewEventSink: Send + Sync {
    fn dispatch(&self, event: TreeViewEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TreeViewEventKind::NodeClicked, r#"{"type":"NODE_CLICKED"}"#)]
    #[case(TreeViewEventKind::ChildrenLoaded { count: 2 }, r#"{"type":"CHILDREN_LOADED","count":2}"#)]
    fn kinds_serialize_with_tag(#[case] kind: TreeViewEventKind, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
    }
}
