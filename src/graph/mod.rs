//! Form graph: parent/child adjacency between documents via include directives.
//!
//! Edges are derived, never stored in documents: a document is a parent of
//! fragment `F` when one of its directive strings resolves to `F`. The same
//! fragment may be included by many parents (and several times by one
//! parent), and malformed configurations may contain cycles.
//!
//! ## Cycle policy
//!
//! Every recursive walk threads one `visited` set through its whole call
//! tree. A document already visited is treated as having no further
//! parents (or children) on that branch. Cycles are truncated silently;
//! whether production data ever legitimately contains them is unknown, so
//! the truncation is not a statement that they are intended.
//!
//! ## Cancellation
//!
//! A graph may carry a [`CancellationToken`]. Recursive walks check it at
//! every step and unwind with [`Cancelled`].

mod cache;

pub use cache::{EdgeIndex, GraphCache};

use indexmap::IndexSet;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::base::DocId;
use crate::document::{DocumentKind, DocumentSource};
use crate::error::Cancelled;
use crate::include::{directives_in, resolve_fragment};

/// Read-only graph queries over a document source.
pub struct FormGraph<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    cache: Option<&'a GraphCache>,
    cancel: Option<&'a CancellationToken>,
    parallel: bool,
}

impl<'a, S: DocumentSource + ?Sized> FormGraph<'a, S> {
    /// A graph that scans the source on every parent query.
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cache: None,
            cancel: None,
            parallel: false,
        }
    }

    /// Answer parent queries from a caller-owned cache.
    pub fn with_cache(mut self, cache: &'a GraphCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Check this token during recursive walks.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Scan documents on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    fn kind(&self, doc: DocId) -> Option<DocumentKind> {
        self.source.document(doc).map(|d| d.kind())
    }

    fn check(&self) -> Result<(), Cancelled> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(Cancelled),
            _ => Ok(()),
        }
    }

    // ========================================================================
    // DIRECT EDGES
    // ========================================================================

    /// Documents with a directive resolving to `doc`.
    ///
    /// Always empty for root and localization documents.
    pub fn find_parents(&self, doc: DocId) -> IndexSet<DocId> {
        if self.kind(doc) != Some(DocumentKind::Fragment) {
            return IndexSet::new();
        }
        if let Some(cache) = self.cache {
            return cache.edges(self.source, self.parallel).parents(doc);
        }

        let source = self.source;
        let includes = |candidate: &DocId| {
            source.document(*candidate).is_some_and(|d| {
                d.kind().is_form()
                    && directives_in(d)
                        .any(|(_, directive)| resolve_fragment(&directive, source) == Some(doc))
            })
        };
        let candidates = source.documents(None);
        if self.parallel {
            let found: Vec<DocId> = candidates.into_par_iter().filter(|c| includes(c)).collect();
            found.into_iter().collect()
        } else {
            candidates.into_iter().filter(|c| includes(c)).collect()
        }
    }

    /// Fragments directly referenced by directives physically present in `doc`.
    ///
    /// A fragment included through several directives appears once.
    pub fn find_children(&self, doc: DocId) -> IndexSet<DocId> {
        if !self.kind(doc).is_some_and(DocumentKind::is_form) {
            return IndexSet::new();
        }
        cache::direct_children(self.source, doc)
    }

    // ========================================================================
    // CLOSURES
    // ========================================================================

    /// Transitive closure of [`find_parents`](Self::find_parents).
    pub fn find_parents_recursive(&self, doc: DocId) -> Result<IndexSet<DocId>, Cancelled> {
        let mut visited = FxHashSet::default();
        visited.insert(doc);
        let mut out = IndexSet::new();
        self.collect_parents(doc, &mut visited, &mut out)?;
        Ok(out)
    }

    fn collect_parents(
        &self,
        doc: DocId,
        visited: &mut FxHashSet<DocId>,
        out: &mut IndexSet<DocId>,
    ) -> Result<(), Cancelled> {
        self.check()?;
        for parent in self.find_parents(doc) {
            out.insert(parent);
            if visited.insert(parent) {
                self.collect_parents(parent, visited, out)?;
            } else {
                trace!("[GRAPH] parent walk: {} already visited", parent);
            }
        }
        Ok(())
    }

    /// Transitive closure of [`find_children`](Self::find_children).
    pub fn find_children_recursive(&self, doc: DocId) -> Result<IndexSet<DocId>, Cancelled> {
        let mut visited = FxHashSet::default();
        visited.insert(doc);
        let mut out = IndexSet::new();
        self.collect_children(doc, &mut visited, &mut out, &mut |_: DocId| true)?;
        Ok(out)
    }

    /// Depth-first child walk. `visit` returning `false` aborts with `Ok(false)`.
    fn collect_children(
        &self,
        doc: DocId,
        visited: &mut FxHashSet<DocId>,
        out: &mut IndexSet<DocId>,
        visit: &mut dyn FnMut(DocId) -> bool,
    ) -> Result<bool, Cancelled> {
        self.check()?;
        for child in self.find_children(doc) {
            if out.insert(child) && !visit(child) {
                return Ok(false);
            }
            if visited.insert(child) && !self.collect_children(child, visited, out, visit)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Root forms among the transitive parents of `doc`.
    pub fn find_topmost_roots(&self, doc: DocId) -> Result<IndexSet<DocId>, Cancelled> {
        Ok(self
            .find_parents_recursive(doc)?
            .into_iter()
            .filter(|&p| self.kind(p) == Some(DocumentKind::Root))
            .collect())
    }

    // ========================================================================
    // RELATED FORMS
    // ========================================================================

    /// Every document sharing a composition root with `doc`.
    ///
    /// The topmost roots of `doc` (plus `doc` itself if it is a root) and the
    /// full recursive children of each. A document with no root ancestor is
    /// treated as its own root. Over-approximates on purpose: used as the
    /// search scope for renames and usage search.
    pub fn find_all_related(
        &self,
        doc: DocId,
        include_self: bool,
    ) -> Result<IndexSet<DocId>, Cancelled> {
        self.walk_related(doc, include_self, &mut |_: DocId| true)
            .map(Option::unwrap_or_default)
    }

    /// Same traversal as [`find_all_related`](Self::find_all_related), reporting
    /// each document to `callback` as it is discovered.
    ///
    /// Returns `None` as soon as the callback returns `false` or the walk is
    /// cancelled; the walk is not resumable.
    pub fn process_all_related(
        &self,
        doc: DocId,
        include_self: bool,
        mut callback: impl FnMut(DocId) -> bool,
    ) -> Option<IndexSet<DocId>> {
        self.walk_related(doc, include_self, &mut callback)
            .ok()
            .flatten()
    }

    fn walk_related(
        &self,
        doc: DocId,
        include_self: bool,
        callback: &mut dyn FnMut(DocId) -> bool,
    ) -> Result<Option<IndexSet<DocId>>, Cancelled> {
        let mut roots = IndexSet::new();
        if self.kind(doc) == Some(DocumentKind::Root) {
            roots.insert(doc);
        }
        roots.extend(self.find_topmost_roots(doc)?);
        if roots.is_empty() {
            roots.insert(doc);
        }
        trace!("[GRAPH] related walk from {}: roots {:?}", doc, roots);

        let mut visit = |d: DocId| (d == doc && !include_self) || callback(d);
        let mut out = IndexSet::new();
        let mut visited = FxHashSet::default();
        for root in roots {
            if out.insert(root) && !visit(root) {
                return Ok(None);
            }
            if visited.insert(root) && !self.collect_children(root, &mut visited, &mut out, &mut visit)? {
                return Ok(None);
            }
        }
        if include_self {
            out.insert(doc);
        } else {
            out.shift_remove(&doc);
        }
        Ok(Some(out))
    }
}
