use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Payload of a tree node together with the key that names its display label.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData<T> {
    data: T,
    label_key: Arc<str>,
}

impl<T> NodeData<T> {
    pub fn new(data: T, label_key: impl Into<Arc<str>>) -> Self {
        Self { data, label_key: label_key.into() }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: NodeLabel> NodeData<T> {
    /// Resolves the display label. Source data without the label key yields an
    /// empty string; well-formed input is a precondition of the embedding
    /// application.
    pub fn label(&self) -> Cow<'_, str> {
        self.data.label(&self.label_key).unwrap_or(Cow::Borrowed(""))
    }
}

/// Looks up a display label inside a node payload.
pub trait NodeLabel {
    fn label(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl NodeLabel for serde_json::Value {
    fn label(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.get(key)? {
            serde_json::Value::String(text) => Some(Cow::Borrowed(text.as_str())),
            serde_json::Value::Null => None,
            other @ (serde_json::Value::Bool(_) | serde_json::Value::Number(_)) => {
                Some(Cow::Owned(other.to_string()))
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl NodeLabel for String {
    fn label(&self, _key: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl NodeLabel for BTreeMap<String, String> {
    fn label(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl NodeLabel for HashMap<String, String> {
    fn label(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|value| Cow::Borrowed(value.as_str()))
    }
}
