//! Document builders for form, fragment and localization fixtures.

use formkey::document::{Document, DocumentKind, DocumentMeta, DocumentSet, Node};
use formkey::ide::AnalysisHost;

/// A root form of `module` at `path`; the form name is the file stem.
pub fn root(path: &str, module: &str, top: Node) -> Document {
    Document::new(path, DocumentKind::Root, DocumentMeta::default().with_module(module), top)
        .expect("valid fixture path")
}

/// A root form that also belongs to an artifact.
pub fn root_in(path: &str, module: &str, artifact: &str, top: Node) -> Document {
    let meta = DocumentMeta::default()
        .with_module(module)
        .with_artifact(artifact);
    Document::new(path, DocumentKind::Root, meta, top).expect("valid fixture path")
}

pub fn fragment(path: &str, top: Node) -> Document {
    Document::new(path, DocumentKind::Fragment, DocumentMeta::default(), top)
        .expect("valid fixture path")
}

/// A fragment that belongs to an artifact.
pub fn fragment_in(path: &str, artifact: &str, top: Node) -> Document {
    let meta = DocumentMeta::default().with_artifact(artifact);
    Document::new(path, DocumentKind::Fragment, meta, top).expect("valid fixture path")
}

/// A flat localization file with one entry per key.
pub fn localization(path: &str, locale: &str, keys: &[&str]) -> Document {
    let top = Node::object(keys.iter().map(|k| (*k, Node::string(format!("text for {k}")))));
    Document::new(
        path,
        DocumentKind::Localization,
        DocumentMeta::default().with_locale(locale),
        top,
    )
    .expect("valid fixture path")
}

pub fn include(path: &str) -> Node {
    Node::string(format!("json://{path}"))
}

pub fn optional_include(path: &str) -> Node {
    Node::string(format!("json?://{path}"))
}

pub fn flat_include(path: &str) -> Node {
    Node::string(format!("json-flat://{path}"))
}

/// A form top with a `groups` array.
pub fn form(groups: Vec<Node>) -> Node {
    Node::object([("groups", Node::array(groups))])
}

/// A named group with a `fields` array.
pub fn group(name: &str, fields: Vec<Node>) -> Node {
    Node::object([("name", Node::string(name)), ("fields", Node::array(fields))])
}

/// A field declared as an object.
pub fn field(name: &str) -> Node {
    Node::object([("name", Node::string(name))])
}

pub fn document_set(docs: Vec<Document>) -> DocumentSet {
    let mut set = DocumentSet::new();
    for doc in docs {
        set.insert(doc);
    }
    set
}

pub fn host(docs: Vec<Document>) -> AnalysisHost {
    let mut host = AnalysisHost::new();
    for doc in docs {
        host.set_document(doc);
    }
    host
}

/// `m/f.json` with group `g1` holding `field1` and `field2`.
pub fn simple_form() -> Document {
    root(
        "m/f.json",
        "m",
        form(vec![group("g1", vec![field("field1"), field("field2")])]),
    )
}
