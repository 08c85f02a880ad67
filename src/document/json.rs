//! JSON input: `serde_json::Value` → [`Node`].

use serde_json::Value;

use super::{Document, DocumentKind, DocumentMeta, Node};
use crate::base::Name;
use crate::error::DocumentError;

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Node::Object(
                map.into_iter()
                    .map(|(k, v)| (Name::new(k), Node::from(v)))
                    .collect(),
            ),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::String(text) => Node::String(Name::new(text)),
            other => Node::Scalar(Name::new(other.to_string())),
        }
    }
}

impl Document {
    /// Parse JSON text into a document. Member order is preserved.
    pub fn from_json_str(
        path: &str,
        kind: DocumentKind,
        meta: DocumentMeta,
        text: &str,
    ) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Document::new(path, kind, meta, Node::from(value))
    }
}
