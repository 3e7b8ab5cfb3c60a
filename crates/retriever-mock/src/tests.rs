use crate::{MockRetriever, MockTreeLoadError, NodeSpec, RetrieverCall, StaticTree};
use futures_lite::future::block_on;
use lazytree_core::node::NodeData;
use lazytree_core::paging::PagingParams;
use lazytree_core::retriever::{PagedTreeNodeRetriever, RetrieverErrorKind, TreeNodeRetriever};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn foods() -> StaticTree {
    StaticTree::default()
}

fn labels(items: &[NodeData<crate::MockItem>]) -> Vec<String> {
    items.iter().map(|item| item.label().into_owned()).collect()
}

fn item(tree: &StaticTree, label: &str) -> NodeData<crate::MockItem> {
    tree.find(label).and_then(|id| tree.item(id)).expect("label present in tree")
}

#[rstest]
fn embedded_tree_has_single_root(foods: StaticTree) {
    assert_eq!(labels(&foods.root_items()), vec!["Foods"]);
    assert_eq!(foods.label_key(), "name");
    let fruit = foods.find("Fruit").unwrap();
    assert_eq!(foods.children_of(fruit).unwrap().len(), 8);
}

#[rstest]
fn array_json_is_a_forest() {
    let tree = StaticTree::from_json(
        &json!([{ "title": "A", "kids": [{ "title": "A1" }] }, { "title": "B" }]),
        "title",
        "kids",
    )
    .unwrap();
    assert_eq!(labels(&tree.root_items()), vec!["A", "B"]);
    let a = tree.find("A").unwrap();
    assert_eq!(labels(&tree.child_items(a, 0..10)), vec!["A1"]);
    assert!(tree.item(a).unwrap().data().value().get("kids").is_none());
}

#[rstest]
#[case(json!([1, 2]), "$[0]")]
#[case(json!({ "name": "A", "children": [{ "name": "B" }, "oops"] }), "$.children[1]")]
fn non_object_nodes_are_rejected(#[case] value: serde_json::Value, #[case] expected_path: &str) {
    match StaticTree::from_json(&value, "name", "children") {
        Err(MockTreeLoadError::NotAnObject { path }) => assert_eq!(path, expected_path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[rstest]
fn children_must_be_an_array() {
    let result = StaticTree::from_json(&json!({ "name": "A", "children": 3 }), "name", "children");
    assert!(matches!(result, Err(MockTreeLoadError::InvalidChildren { .. })));
}

#[rstest]
fn missing_label_renders_empty() {
    let tree = StaticTree::from_json(&json!({ "id": 1 }), "name", "children").unwrap();
    assert_eq!(tree.root_items()[0].label(), "");
}

#[rstest]
fn builder_tree_with_fields() {
    let tree = StaticTree::new(vec![
        NodeSpec::new("Root").with_field("kind", "folder").with_leaves("Leaf", 3),
    ]);
    let root = &tree.root_items()[0];
    assert_eq!(root.data().value()["kind"], "folder");
    assert_eq!(labels(&tree.child_items(root.data().id(), 1..2)), vec!["Leaf 2"]);
}

#[rstest]
#[case(0, 3, vec!["Apple", "Banana", "Fruit loops"])]
#[case(6, 5, vec!["Kiwi", "Coconut"])]
#[case(8, 5, vec![])]
#[case(20, 1, vec![])]
fn paged_children_slice_the_list(
    foods: StaticTree,
    #[case] offset: usize,
    #[case] limit: usize,
    #[case] expected: Vec<&str>,
) {
    let fruit = item(&foods, "Fruit");
    let retriever = MockRetriever::new(foods);
    let paging = PagingParams::new(offset, limit).unwrap();
    let page = block_on(retriever.get_paged_children(&fruit, paging)).unwrap();
    assert_eq!(labels(&page), expected);
    assert_eq!(retriever.paged_calls(), vec![("Fruit".to_owned(), paging)]);
}

#[rstest]
fn counts_and_probes(foods: StaticTree) {
    let fruit = item(&foods, "Fruit");
    let apple = item(&foods, "Apple");
    let retriever = MockRetriever::new(foods);

    assert_eq!(block_on(retriever.get_child_count(&fruit)).unwrap(), 8);
    assert!(block_on(retriever.has_children(&fruit)).unwrap());
    assert!(!block_on(retriever.has_children(&apple)).unwrap());
    assert_eq!(retriever.fetch_count(), 0);
    assert_eq!(
        retriever.take_calls(),
        vec![
            RetrieverCall::GetChildCount { label: "Fruit".to_owned() },
            RetrieverCall::HasChildren { label: "Fruit".to_owned() },
            RetrieverCall::HasChildren { label: "Apple".to_owned() },
        ]
    );
    assert!(retriever.calls().is_empty());
}

#[rstest]
fn injected_failure_until_recovered(foods: StaticTree) {
    let orange = item(&foods, "Orange");
    let retriever = MockRetriever::new(foods);
    retriever.fail_for("Orange");

    let error = block_on(retriever.get_children(&orange)).unwrap_err();
    assert_eq!(error.kind, RetrieverErrorKind::Failed);
    assert!(block_on(retriever.has_children(&orange)).unwrap());

    retriever.recover("Orange");
    let children = block_on(retriever.get_children(&orange)).unwrap();
    assert_eq!(labels(&children), vec!["Pumpkins", "Carrots"]);
    assert_eq!(retriever.fetch_count(), 2);
}

#[rstest]
fn has_children_failure_leaves_fetches_working(foods: StaticTree) {
    let orange = item(&foods, "Orange");
    let retriever = MockRetriever::new(foods);
    retriever.fail_has_children_for("Orange");

    let error = block_on(retriever.has_children(&orange)).unwrap_err();
    assert_eq!(error.kind, RetrieverErrorKind::Failed);
    assert_eq!(block_on(retriever.get_children(&orange)).unwrap().len(), 2);

    retriever.recover("Orange");
    assert!(block_on(retriever.has_children(&orange)).unwrap());
}

#[rstest]
fn retriever_variants(foods: StaticTree) {
    let retriever = MockRetriever::new(foods);
    assert!(!retriever.basic().is_paged());
    assert!(retriever.paged().is_paged());
    assert_eq!(retriever.roots().len(), 1);
}
