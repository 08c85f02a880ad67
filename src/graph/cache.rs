//! Caller-owned graph cache.
//!
//! The cache holds one [`EdgeIndex`] tagged with the generation of the
//! document source it was built from. A lookup with a different generation
//! rebuilds the index; nothing is ever invalidated implicitly. One cache
//! serves one source view: sharing a cache between differently scoped views
//! of the same set is not supported.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexSet;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::base::DocId;
use crate::document::DocumentSource;
use crate::include::{directives_in, resolve_fragment};

/// Direct include edges of every form document, in both directions.
#[derive(Clone, Debug, Default)]
pub struct EdgeIndex {
    generation: u64,
    /// document → fragments its directives resolve to
    children: FxHashMap<DocId, IndexSet<DocId>>,
    /// fragment → documents whose directives resolve to it
    parents: FxHashMap<DocId, IndexSet<DocId>>,
}

impl EdgeIndex {
    /// Scan every form document of `source` once.
    pub fn build<S: DocumentSource + ?Sized>(source: &S, parallel: bool) -> Self {
        let start = Instant::now();
        let forms: Vec<DocId> = source
            .documents(None)
            .into_iter()
            .filter(|&id| source.document(id).is_some_and(|d| d.kind().is_form()))
            .collect();

        let scanned: Vec<(DocId, IndexSet<DocId>)> = if parallel {
            forms
                .par_iter()
                .map(|&id| (id, direct_children(source, id)))
                .collect()
        } else {
            forms
                .iter()
                .map(|&id| (id, direct_children(source, id)))
                .collect()
        };

        let mut index = EdgeIndex {
            generation: source.generation(),
            ..Self::default()
        };
        for (parent, children) in scanned {
            for &child in &children {
                index.parents.entry(child).or_default().insert(parent);
            }
            index.children.insert(parent, children);
        }

        info!(
            "[GRAPH] edge index: {} form documents, {} included fragments, generation {}, {:?}",
            forms.len(),
            index.parents.len(),
            index.generation,
            start.elapsed()
        );
        index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn children(&self, doc: DocId) -> IndexSet<DocId> {
        self.children.get(&doc).cloned().unwrap_or_default()
    }

    pub fn parents(&self, doc: DocId) -> IndexSet<DocId> {
        self.parents.get(&doc).cloned().unwrap_or_default()
    }
}

/// Fragments referenced by directives physically present in `doc`.
pub(crate) fn direct_children<S: DocumentSource + ?Sized>(source: &S, doc: DocId) -> IndexSet<DocId> {
    let Some(document) = source.document(doc) else {
        return IndexSet::new();
    };
    directives_in(document)
        .filter_map(|(_, directive)| resolve_fragment(&directive, source))
        .collect()
}

/// Memoized [`EdgeIndex`] keyed by source generation.
#[derive(Debug, Default)]
pub struct GraphCache {
    edges: RwLock<Option<Arc<EdgeIndex>>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The edge index for the source's current generation, rebuilding if stale.
    pub fn edges<S: DocumentSource + ?Sized>(&self, source: &S, parallel: bool) -> Arc<EdgeIndex> {
        let generation = source.generation();
        if let Some(edges) = self.current(generation) {
            return edges;
        }

        let mut slot = self.edges.write();
        // Another reader may have rebuilt while we waited for the lock.
        if let Some(edges) = slot.as_ref().filter(|e| e.generation == generation) {
            return Arc::clone(edges);
        }
        debug!(
            "[CACHE] edge index stale (cached {:?}, source {}), rebuilding",
            slot.as_ref().map(|e| e.generation),
            generation
        );
        let built = Arc::new(EdgeIndex::build(source, parallel));
        *slot = Some(Arc::clone(&built));
        built
    }

    /// Cached generation, if any.
    pub fn generation(&self) -> Option<u64> {
        self.edges.read().as_ref().map(|e| e.generation)
    }

    /// Drop the cached index.
    pub fn invalidate(&self) {
        *self.edges.write() = None;
    }

    fn current(&self, generation: u64) -> Option<Arc<EdgeIndex>> {
        self.edges
            .read()
            .as_ref()
            .filter(|e| e.generation == generation)
            .map(Arc::clone)
    }
}
