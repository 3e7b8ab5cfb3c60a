use lazytree_core::node::{NodeData, NodeLabel};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_LABEL_KEY: &str = "name";
pub const DEFAULT_CHILDREN_KEY: &str = "children";

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    label: String,
    fields: Map<String, Value>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), fields: Map::new(), children: Vec::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = NodeSpec>,
    {
        self.children.extend(children);
        self
    }

    /// Adds `count` leaves labelled `{prefix} {n}`, starting at 1.
    pub fn with_leaves(self, prefix: &str, count: usize) -> Self {
        self.with_children((1..=count).map(|n| NodeSpec::new(format!("{prefix} {n}"))))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[NodeSpec] {
        &self.children
    }
}

/// Payload handed out by the mock retriever: the node's position in the
/// static tree plus its JSON object (without the children).
#[derive(Clone, Debug, PartialEq)]
pub struct MockItem {
    id: usize,
    value: Value,
}

impl MockItem {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl NodeLabel for MockItem {
    fn label(&self, key: &str) -> Option<Cow<'_, str>> {
        self.value.label(key)
    }
}

#[derive(Debug, Error)]
pub enum MockTreeLoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node at {path} is not an object")]
    NotAnObject { path: String },
    #[error("children of node at {path} must be an array")]
    InvalidChildren { path: String },
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    children: Vec<usize>,
}

/// Immutable tree the mock retriever serves pages from.
#[derive(Clone, Debug)]
pub struct StaticTree {
    entries: Vec<Entry>,
    roots: Vec<usize>,
    label_key: Arc<str>,
}

impl StaticTree {
    pub fn new(roots: Vec<NodeSpec>) -> Self {
        let mut entries = Vec::new();
        let roots = roots.iter().map(|spec| push_spec(&mut entries, spec)).collect();
        Self { entries, roots, label_key: Arc::from(DEFAULT_LABEL_KEY) }
    }

    /// Loads object-shaped JSON: a single object is one root, an array is a
    /// forest. Nested nodes live in an array under `children_key`.
    pub fn from_json(
        value: &Value,
        label_key: &str,
        children_key: &str,
    ) -> Result<Self, MockTreeLoadError> {
        let mut entries = Vec::new();
        let roots = match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    push_json(&mut entries, item, children_key, &format!("$[{index}]"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => vec![push_json(&mut entries, value, children_key, "$")?],
        };
        Ok(Self { entries, roots, label_key: Arc::from(label_key) })
    }

    pub fn from_json_str(
        json: &str,
        label_key: &str,
        children_key: &str,
    ) -> Result<Self, MockTreeLoadError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value, label_key, children_key)
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root_items(&self) -> Vec<NodeData<MockItem>> {
        self.roots.iter().filter_map(|id| self.item(*id)).collect()
    }

    pub fn item(&self, id: usize) -> Option<NodeData<MockItem>> {
        let entry = self.entries.get(id)?;
        let item = MockItem { id, value: entry.value.clone() };
        Some(NodeData::new(item, Arc::clone(&self.label_key)))
    }

    pub fn children_of(&self, id: usize) -> Option<&[usize]> {
        self.entries.get(id).map(|entry| entry.children.as_slice())
    }

    /// Children of `id` inside `range`, clamped to the available ones.
    pub fn child_items(&self, id: usize, range: Range<usize>) -> Vec<NodeData<MockItem>> {
        let children = self.children_of(id).unwrap_or_default();
        let end = range.end.min(children.len());
        let start = range.start.min(end);
        children[start..end].iter().filter_map(|child| self.item(*child)).collect()
    }

    /// First node in document order carrying `label`.
    pub fn find(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.value.label(&self.label_key).as_deref() == Some(label))
    }
}

impl Default for StaticTree {
    fn default() -> Self {
        const JSON: &str = include_str!("../assets/foods.json");
        Self::from_json_str(JSON, DEFAULT_LABEL_KEY, DEFAULT_CHILDREN_KEY)
            .expect("embedded foods.json could not be parsed")
    }
}

fn push_spec(entries: &mut Vec<Entry>, spec: &NodeSpec) -> usize {
    let mut fields = spec.fields.clone();
    fields.insert(DEFAULT_LABEL_KEY.to_owned(), Value::String(spec.label.clone()));
    let index = entries.len();
    entries.push(Entry { value: Value::Object(fields), children: Vec::new() });
    let children = spec.children.iter().map(|child| push_spec(entries, child)).collect();
    entries[index].children = children;
    index
}

fn push_json(
    entries: &mut Vec<Entry>,
    value: &Value,
    children_key: &str,
    path: &str,
) -> Result<usize, MockTreeLoadError> {
    let Value::Object(map) = value else {
        return Err(MockTreeLoadError::NotAnObject { path: path.to_owned() });
    };
    let mut fields = map.clone();
    let children = fields.remove(children_key);
    let index = entries.len();
    entries.push(Entry { value: Value::Object(fields), children: Vec::new() });

    let children = match children {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(position, child)| {
                let child_path = format!("{path}.{children_key}[{position}]");
                push_json(entries, child, children_key, &child_path)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(MockTreeLoadError::InvalidChildren { path: path.to_owned() }),
    };
    entries[index].children = children;
    Ok(index)
}
