//! Document storage and the capability seam consumed by the core.

use rustc_hash::FxHashMap;

use super::{Document, DocumentKind, normalize_path};
use crate::base::{DocId, Name};
use crate::config::SearchScope;

/// Read access to a document set, as the graph and resolver layers need it.
///
/// Implementations must be immutable for the duration of a query; the
/// generation must change whenever the set of documents or any document's
/// content changes.
pub trait DocumentSource: Sync {
    /// Look up a document by handle.
    fn document(&self, id: DocId) -> Option<&Document>;

    /// All visible documents, optionally restricted to one kind, in insertion order.
    fn documents(&self, kind: Option<DocumentKind>) -> Vec<DocId>;

    /// Every fragment an include target path may denote: the exact path
    /// first, then component-boundary suffix matches in insertion order.
    fn fragment_candidates(&self, path: &str) -> Vec<DocId>;

    /// Resolve an include directive's target path to a fragment document.
    fn lookup_fragment(&self, path: &str) -> Option<DocId> {
        self.fragment_candidates(path).into_iter().next()
    }

    /// Monotonic change counter used as the cache invalidation token.
    fn generation(&self) -> u64;
}

/// In-memory document store.
#[derive(Clone, Debug, Default)]
pub struct DocumentSet {
    /// Slot per handle; `None` once removed.
    slots: Vec<Option<Document>>,
    /// Exact relative path → handle
    by_path: FxHashMap<Name, DocId>,
    /// Every component-boundary suffix of each fragment path → handles in insertion order
    fragment_suffixes: FxHashMap<Name, Vec<DocId>>,
    generation: u64,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, replacing any document with the same path.
    ///
    /// Replacement keeps the existing handle.
    pub fn insert(&mut self, document: Document) -> DocId {
        self.generation += 1;
        let path = Name::new(document.path());
        if let Some(&id) = self.by_path.get(&path) {
            self.unindex_fragment(id);
            let is_fragment = document.kind() == DocumentKind::Fragment;
            self.slots[id.index()] = Some(document);
            if is_fragment {
                self.index_fragment(id, &path);
            }
            return id;
        }

        let id = DocId::new(self.slots.len() as u32);
        if document.kind() == DocumentKind::Fragment {
            self.index_fragment(id, &path);
        }
        self.slots.push(Some(document));
        self.by_path.insert(path, id);
        id
    }

    /// Remove a document by path. Returns the removed document.
    pub fn remove(&mut self, path: &str) -> Option<Document> {
        let path = normalize_path(path);
        let id = self.by_path.remove(path.as_str())?;
        self.generation += 1;
        self.unindex_fragment(id);
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Look up a handle by exact relative path.
    pub fn id_of(&self, path: &str) -> Option<DocId> {
        self.by_path.get(normalize_path(path).as_str()).copied()
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Iterate over live documents with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|d| (DocId::new(i as u32), d)))
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// A view restricted to the given scope.
    pub fn scoped(&self, scope: SearchScope) -> ScopedSource<'_, Self> {
        ScopedSource::new(self, scope)
    }

    fn index_fragment(&mut self, id: DocId, path: &str) {
        for suffix in path_suffixes(path) {
            self.fragment_suffixes
                .entry(Name::new(suffix))
                .or_default()
                .push(id);
        }
    }

    fn unindex_fragment(&mut self, id: DocId) {
        self.fragment_suffixes.retain(|_, ids| {
            ids.retain(|&i| i != id);
            !ids.is_empty()
        });
    }
}

impl DocumentSource for DocumentSet {
    fn document(&self, id: DocId) -> Option<&Document> {
        self.get(id)
    }

    fn documents(&self, kind: Option<DocumentKind>) -> Vec<DocId> {
        self.iter()
            .filter(|(_, doc)| kind.is_none_or(|k| doc.kind() == k))
            .map(|(id, _)| id)
            .collect()
    }

    fn fragment_candidates(&self, path: &str) -> Vec<DocId> {
        let path = normalize_path(path);
        let exact = self
            .by_path
            .get(path.as_str())
            .copied()
            .filter(|&id| self.get(id).is_some_and(|d| d.kind() == DocumentKind::Fragment));
        let suffixes = self
            .fragment_suffixes
            .get(path.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        exact
            .into_iter()
            .chain(suffixes.iter().copied().filter(|&id| Some(id) != exact))
            .collect()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

/// `forms/common/addr.json` → `forms/common/addr.json`, `common/addr.json`, `addr.json`.
fn path_suffixes(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path).chain(
        path.match_indices('/')
            .map(move |(i, _)| &path[i + 1..])
            .filter(|s| !s.is_empty()),
    )
}

// ============================================================================
// SCOPED VIEW
// ============================================================================

/// A [`DocumentSource`] that hides documents outside a [`SearchScope`].
pub struct ScopedSource<'a, S: DocumentSource + ?Sized> {
    inner: &'a S,
    scope: SearchScope,
}

impl<'a, S: DocumentSource + ?Sized> ScopedSource<'a, S> {
    pub fn new(inner: &'a S, scope: SearchScope) -> Self {
        Self { inner, scope }
    }

    fn visible(&self, doc: &Document) -> bool {
        self.scope.admits(doc.artifact())
    }
}

impl<S: DocumentSource + ?Sized> DocumentSource for ScopedSource<'_, S> {
    fn document(&self, id: DocId) -> Option<&Document> {
        self.inner.document(id).filter(|d| self.visible(d))
    }

    fn documents(&self, kind: Option<DocumentKind>) -> Vec<DocId> {
        self.inner
            .documents(kind)
            .into_iter()
            .filter(|&id| self.document(id).is_some())
            .collect()
    }

    fn fragment_candidates(&self, path: &str) -> Vec<DocId> {
        self.inner
            .fragment_candidates(path)
            .into_iter()
            .filter(|&id| self.document(id).is_some())
            .collect()
    }

    fn generation(&self) -> u64 {
        self.inner.generation()
    }
}
