//! Localization entries naming a form element.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::base::{DocId, Name, NodeId, NodeRef};
use crate::document::{DocumentKind, DocumentSource};
use crate::error::Cancelled;
use crate::graph::{FormGraph, GraphCache};
use crate::hir::{FormIndex, LocalizationIndex};

/// A localization entry referring to an element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyReference {
    /// Localization file.
    pub file: DocId,
    pub property: NodeId,
    pub key: Name,
    pub locale: Option<Name>,
    /// Root form under which the key names the element.
    pub root: DocId,
}

/// Result of a find-references request.
#[derive(Clone, Debug, Default)]
pub struct ReferenceResult {
    pub references: Vec<KeyReference>,
    /// Root forms that were searched.
    pub roots: IndexSet<DocId>,
}

impl ReferenceResult {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

/// Every entry, in every locale, that names `element` in a root form reaching it.
///
/// Roots are the element's own document if it is a root, plus its topmost
/// roots. Each `(file, property)` is reported once.
pub fn find_key_references<S: DocumentSource + ?Sized>(
    source: &S,
    forms: &FormIndex,
    localizations: &LocalizationIndex,
    cache: Option<&GraphCache>,
    cancel: Option<&CancellationToken>,
    element: NodeRef,
) -> Result<ReferenceResult, Cancelled> {
    let mut graph = FormGraph::new(source);
    if let Some(cache) = cache {
        graph = graph.with_cache(cache);
    }
    if let Some(token) = cancel {
        graph = graph.with_cancellation(token);
    }

    let mut roots = IndexSet::new();
    if source.document(element.doc).map(|d| d.kind()) == Some(DocumentKind::Root) {
        roots.insert(element.doc);
    }
    roots.extend(graph.find_topmost_roots(element.doc)?);

    let mut seen = FxHashSet::default();
    let mut references = Vec::new();
    for &root in &roots {
        for id in forms.instances_in(root, element) {
            let Some(key) = forms.localization_key(source, id) else {
                continue;
            };
            for entry in localizations.entries_for(&key) {
                if seen.insert((entry.file, entry.property)) {
                    references.push(KeyReference {
                        file: entry.file,
                        property: entry.property,
                        key: Name::from(key.as_str()),
                        locale: entry.locale.clone(),
                        root,
                    });
                }
            }
        }
    }
    Ok(ReferenceResult { references, roots })
}
