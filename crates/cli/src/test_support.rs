use crate::util::{TreeArgs, build_view};
use lazytree_retriever_mock::{MockItem, MockRetriever};
use lazytree_runtime::TreeView;
use std::sync::Arc;

pub fn tree_args() -> TreeArgs {
    TreeArgs { no_color: true, ..TreeArgs::default() }
}

pub fn view(args: &TreeArgs) -> (TreeView<MockItem>, Arc<MockRetriever>) {
    build_view(args).expect("tree view")
}
