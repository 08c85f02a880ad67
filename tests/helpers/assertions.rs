//! Lookup and assertion helpers over analysis snapshots.

use formkey::base::{DocId, NodeId, NodeRef};
use formkey::document::DocumentSource;
use formkey::ide::Analysis;

/// Handle of a document by path.
pub fn doc_id(analysis: &Analysis<'_>, path: &str) -> DocId {
    analysis
        .source()
        .documents(None)
        .into_iter()
        .find(|&id| analysis.document(id).is_some_and(|d| d.path() == path))
        .unwrap_or_else(|| panic!("Expected document '{}'", path))
}

/// The element a key names, looked up through the resolver.
pub fn element_for(analysis: &Analysis<'_>, key: &str) -> NodeRef {
    analysis
        .resolve_key(key)
        .target()
        .and_then(|symbol| symbol.element())
        .unwrap_or_else(|| panic!("Expected '{}' to name an element", key))
}

/// Property node of the entry with `key` in `file`.
pub fn property_for(analysis: &Analysis<'_>, file: DocId, key: &str) -> NodeId {
    analysis
        .localizations()
        .entries_in(file)
        .find(|e| e.key() == key)
        .map(|e| e.property)
        .unwrap_or_else(|| panic!("Expected entry '{}' in {}", key, file))
}

/// Assert a set-like collection holds no duplicates.
pub fn assert_distinct<T: std::hash::Hash + Eq + std::fmt::Debug>(items: &[T]) {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        assert!(seen.insert(item), "Duplicate item: {:?}", item);
    }
}
