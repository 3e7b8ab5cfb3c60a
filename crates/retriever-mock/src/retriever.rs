use crate::tree::{MockItem, StaticTree};
use lazytree_core::node::NodeData;
use lazytree_core::paging::PagingParams;
use lazytree_core::retriever::{
    PagedTreeNodeRetriever, Retriever, RetrieverError, RetrieverErrorKind, RetrieverFuture,
    TreeNodeRetriever, ready,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// A call received by [`MockRetriever`], identified by the node label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetrieverCall {
    HasChildren { label: String },
    GetChildren { label: String },
    GetPagedChildren { label: String, paging: PagingParams },
    GetChildCount { label: String },
}

impl RetrieverCall {
    pub fn label(&self) -> &str {
        match self {
            RetrieverCall::HasChildren { label }
            | RetrieverCall::GetChildren { label }
            | RetrieverCall::GetPagedChildren { label, .. }
            | RetrieverCall::GetChildCount { label } => label,
        }
    }

    /// True for calls that load children.
    pub fn is_fetch(&self) -> bool {
        matches!(self, RetrieverCall::GetChildren { .. } | RetrieverCall::GetPagedChildren { .. })
    }
}

/// Serves children from a [`StaticTree`] and records every call.
///
/// Futures are created resolved; tests decide the completion order by
/// choosing when to resolve the tickets handed out by the tree view.
#[derive(Debug)]
pub struct MockRetriever {
    tree: StaticTree,
    calls: Mutex<Vec<RetrieverCall>>,
    failing: Mutex<HashSet<String>>,
    failing_probes: Mutex<HashSet<String>>,
}

impl MockRetriever {
    pub fn new(tree: StaticTree) -> Arc<Self> {
        Arc::new(Self {
            tree,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            failing_probes: Mutex::new(HashSet::new()),
        })
    }

    pub fn tree(&self) -> &StaticTree {
        &self.tree
    }

    pub fn roots(&self) -> Vec<NodeData<MockItem>> {
        self.tree.root_items()
    }

    pub fn basic(self: &Arc<Self>) -> Retriever<MockItem> {
        Retriever::Basic(Arc::clone(self) as Arc<dyn TreeNodeRetriever<MockItem>>)
    }

    pub fn paged(self: &Arc<Self>) -> Retriever<MockItem> {
        Retriever::Paged(Arc::clone(self) as Arc<dyn PagedTreeNodeRetriever<MockItem>>)
    }

    /// Makes every fetch for nodes labelled `label` fail.
    pub fn fail_for(&self, label: impl Into<String>) {
        self.failing.lock().expect("failure set poisoned").insert(label.into());
    }

    /// Makes `has_children` fail for nodes labelled `label`.
    pub fn fail_has_children_for(&self, label: impl Into<String>) {
        self.failing_probes.lock().expect("failure set poisoned").insert(label.into());
    }

    pub fn recover(&self, label: &str) {
        self.failing.lock().expect("failure set poisoned").remove(label);
        self.failing_probes.lock().expect("failure set poisoned").remove(label);
    }

    pub fn calls(&self) -> Vec<RetrieverCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn take_calls(&self) -> Vec<RetrieverCall> {
        std::mem::take(&mut *self.calls.lock().expect("call log poisoned"))
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").iter().filter(|call| call.is_fetch()).count()
    }

    pub fn paged_calls(&self) -> Vec<(String, PagingParams)> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter_map(|call| match call {
                RetrieverCall::GetPagedChildren { label, paging } => Some((label.clone(), *paging)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RetrieverCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    fn lookup(&self, node: &NodeData<MockItem>) -> Result<&[usize], RetrieverError> {
        self.tree.children_of(node.data().id()).ok_or_else(|| {
            RetrieverError::new(
                RetrieverErrorKind::InvalidArgument,
                format!("unknown mock node {}", node.data().id()),
            )
        })
    }

    fn check_failure(&self, label: &str) -> Result<(), RetrieverError> {
        Self::check_in(&self.failing, label)
    }

    fn check_in(set: &Mutex<HashSet<String>>, label: &str) -> Result<(), RetrieverError> {
        if set.lock().expect("failure set poisoned").contains(label) {
            return Err(RetrieverError::new(
                RetrieverErrorKind::Failed,
                format!("mock failure for '{label}'"),
            ));
        }
        Ok(())
    }
}

impl TreeNodeRetriever<MockItem> for MockRetriever {
    fn has_children(&self, node: &NodeData<MockItem>) -> RetrieverFuture<bool> {
        let label = node.label().into_owned();
        self.record(RetrieverCall::HasChildren { label: label.clone() });
        let result = Self::check_in(&self.failing_probes, &label)
            .and_then(|()| self.lookup(node))
            .map(|children| !children.is_empty());
        ready(result)
    }

    fn get_children(&self, node: &NodeData<MockItem>) -> RetrieverFuture<Vec<NodeData<MockItem>>> {
        let label = node.label().into_owned();
        self.record(RetrieverCall::GetChildren { label: label.clone() });
        let result = self
            .check_failure(&label)
            .and_then(|()| self.lookup(node))
            .map(|children| self.tree.child_items(node.data().id(), 0..children.len()));
        ready(result)
    }
}

impl PagedTreeNodeRetriever<MockItem> for MockRetriever {
    fn get_paged_children(
        &self,
        node: &NodeData<MockItem>,
        paging: PagingParams,
    ) -> RetrieverFuture<Vec<NodeData<MockItem>>> {
        let label = node.label().into_owned();
        self.record(RetrieverCall::GetPagedChildren { label: label.clone(), paging });
        let result = self
            .check_failure(&label)
            .and_then(|()| self.lookup(node))
            .map(|_| self.tree.child_items(node.data().id(), paging.offset()..paging.end()));
        ready(result)
    }

    fn get_child_count(&self, node: &NodeData<MockItem>) -> RetrieverFuture<usize> {
        let label = node.label().into_owned();
        self.record(RetrieverCall::GetChildCount { label: label.clone() });
        let result =
            self.check_failure(&label).and_then(|()| self.lookup(node)).map(<[usize]>::len);
        ready(result)
    }
}
