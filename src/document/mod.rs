//! Document model: generic, already-parsed trees with stable node identity.
//!
//! Documents are loaded by the caller and handed over as [`Node`] trees.
//! On construction a tree is lowered into an arena: every node gets a
//! [`NodeId`], object members become `Property` nodes, and physical
//! parent/child links are recorded. Links between documents are never
//! stored here; they are computed by the include and graph layers.
//!
//! ## Key Types
//!
//! - [`Node`]: input tree handed over by the loader
//! - [`Document`]: arena-backed, read-only document
//! - [`DocumentSet`]: in-memory store and default [`DocumentSource`]

#[cfg(feature = "json")]
mod json;
mod set;

pub use set::{DocumentSet, DocumentSource, ScopedSource};

use crate::base::{Name, NodeId};
use crate::error::DocumentError;

// ============================================================================
// DOCUMENT KIND AND METADATA
// ============================================================================

/// The role a document plays in the form hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A top-level form with a resolvable name.
    Root,
    /// A form fragment meant to be spliced into parents via include directives.
    Fragment,
    /// A flat file of localization entries.
    Localization,
}

impl DocumentKind {
    /// Root and fragment documents both take part in the form graph.
    pub fn is_form(self) -> bool {
        matches!(self, DocumentKind::Root | DocumentKind::Fragment)
    }
}

/// Facts about a document known to the loader but not stored in its content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Module the document belongs to (first token of its localization keys).
    pub module: Option<Name>,
    /// Containing library or project; used for scoping and placement preference.
    pub artifact: Option<Name>,
    /// Locale of a localization file.
    pub locale: Option<Name>,
}

impl DocumentMeta {
    pub fn with_module(mut self, module: impl Into<Name>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<Name>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<Name>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

// ============================================================================
// INPUT TREE
// ============================================================================

/// A generic, already-parsed value tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Ordered object members.
    Object(Vec<(Name, Node)>),
    /// Ordered array items.
    Array(Vec<Node>),
    /// A string literal (unquoted text).
    String(Name),
    /// Any other scalar (number, boolean, null), kept as its source text.
    Scalar(Name),
}

impl Node {
    pub fn object<K, I>(members: I) -> Self
    where
        K: Into<Name>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(items: impl IntoIterator<Item = Node>) -> Self {
        Node::Array(items.into_iter().collect())
    }

    pub fn string(text: impl Into<Name>) -> Self {
        Node::String(text.into())
    }

    pub fn scalar(text: impl Into<Name>) -> Self {
        Node::Scalar(text.into())
    }
}

// ============================================================================
// ARENA
// ============================================================================

/// Kind of an arena node. A `Property` has exactly one child: its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String(Name),
    Property(Name),
    Scalar(Name),
}

/// One node inside a document arena.
#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A read-only document: path, kind, metadata and its node arena.
#[derive(Clone, Debug)]
pub struct Document {
    path: Name,
    kind: DocumentKind,
    meta: DocumentMeta,
    nodes: Vec<NodeData>,
}

impl Document {
    /// Lower an input tree into a new document.
    ///
    /// The path is relative to the caller's source root and must end in a
    /// file name. Backslashes are normalized to `/`.
    pub fn new(
        path: &str,
        kind: DocumentKind,
        meta: DocumentMeta,
        root: Node,
    ) -> Result<Self, DocumentError> {
        let path = normalize_path(path);
        if path.is_empty() || path.ends_with('/') {
            return Err(DocumentError::invalid_path(path));
        }
        let mut doc = Self {
            path: Name::new(path),
            kind,
            meta,
            nodes: Vec::new(),
        };
        doc.lower(root, None);
        Ok(doc)
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn lower(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        match node {
            Node::Object(members) => {
                let id = self.push(NodeKind::Object, parent);
                for (key, value) in members {
                    let prop = self.push(NodeKind::Property(key), Some(id));
                    self.lower(value, Some(prop));
                }
                id
            }
            Node::Array(items) => {
                let id = self.push(NodeKind::Array, parent);
                for item in items {
                    self.lower(item, Some(id));
                }
                id
            }
            Node::String(text) => self.push(NodeKind::String(text), parent),
            Node::Scalar(text) => self.push(NodeKind::Scalar(text), parent),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn module(&self) -> Option<&str> {
        self.meta.module.as_deref()
    }

    pub fn artifact(&self) -> Option<&str> {
        self.meta.artifact.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.meta.locale.as_deref()
    }

    /// File name without its last extension: `forms/order.json` → `order`.
    pub fn name(&self) -> &str {
        let file = self.path.rsplit('/').next().unwrap_or(&self.path);
        match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        }
    }

    /// The top node. Every document has one.
    pub fn top(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub fn kind_of(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn is_object(&self, id: NodeId) -> bool {
        matches!(self.kind_of(id), Some(NodeKind::Object))
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        matches!(self.kind_of(id), Some(NodeKind::Array))
    }

    /// Text of a string node.
    pub fn string(&self, id: NodeId) -> Option<&str> {
        match self.kind_of(id) {
            Some(NodeKind::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Key of a property node.
    pub fn property_key(&self, id: NodeId) -> Option<&str> {
        match self.kind_of(id) {
            Some(NodeKind::Property(key)) => Some(key),
            _ => None,
        }
    }

    /// Value node of a property node.
    pub fn property_value(&self, prop: NodeId) -> Option<NodeId> {
        match self.kind_of(prop) {
            Some(NodeKind::Property(_)) => self.children(prop).first().copied(),
            _ => None,
        }
    }

    /// Property nodes of an object, in declaration order.
    pub fn properties(&self, object: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        let members = if self.is_object(object) {
            self.children(object)
        } else {
            &[]
        };
        members
            .iter()
            .filter_map(|&prop| self.property_key(prop).map(|key| (key, prop)))
    }

    /// First property of an object with the given key.
    pub fn property(&self, object: NodeId, key: &str) -> Option<NodeId> {
        self.properties(object)
            .find(|(k, _)| *k == key)
            .map(|(_, prop)| prop)
    }

    /// Value of the first property with the given key.
    pub fn member(&self, object: NodeId, key: &str) -> Option<NodeId> {
        self.property(object, key)
            .and_then(|prop| self.property_value(prop))
    }

    /// String value of the first property with the given key.
    pub fn member_str(&self, object: NodeId, key: &str) -> Option<&str> {
        self.member(object, key).and_then(|value| self.string(value))
    }

    /// All node ids in arena (pre-)order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId::new(i as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Normalize a relative path: `\` → `/`, strip leading `./` and `/`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}
