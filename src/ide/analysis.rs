//! AnalysisHost and Analysis: state ownership and consistent snapshots.
//!
//! The `AnalysisHost` owns the document set, the graph cache and the derived
//! indices. `Analysis` snapshots borrow all of them, so every query of one
//! snapshot sees the same generation.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AnalysisHost::new();
//! host.set_document(document);
//!
//! let analysis = host.analysis();
//! let resolution = analysis.resolve_key("crm.form.person.address.street");
//! let placement = analysis.place_key("crm.form.person.address.zip", Some("de"), None);
//! ```

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::base::{DocId, NodeRef};
use crate::config::AnalysisConfig;
use crate::document::{Document, DocumentSet, DocumentSource, ScopedSource};
use crate::error::Cancelled;
use crate::graph::{FormGraph, GraphCache};
use crate::hir::{
    Diagnostic, FakeSymbol, FieldBinder, FormElement, FormIndex, FormKeyKind, LocalizationEntry,
    LocalizationIndex, Resolution, Symbol, SymbolResolver, check_expansion, fake_declarations,
};

use super::placement::{LocalizationTarget, Placement, PlacementEngine};
use super::references::{ReferenceResult, find_key_references};

/// Owns all mutable state.
///
/// Apply changes via `set_document()` and `remove_document()`, then get a
/// consistent snapshot via `analysis()`.
#[derive(Default)]
pub struct AnalysisHost {
    documents: DocumentSet,
    config: AnalysisConfig,
    cache: GraphCache,
    /// Derived indices, tagged with the generation they were built from.
    forms: Option<FormIndex>,
    localizations: Option<LocalizationIndex>,
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the configuration. A new scope drops every derived index.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        if config.scope != self.config.scope {
            self.mark_dirty();
        }
        self.config = config;
    }

    /// Insert or replace a document. Returns its handle.
    pub fn set_document(&mut self, document: Document) -> DocId {
        self.documents.insert(document)
    }

    /// Parse and insert a JSON document.
    #[cfg(feature = "json")]
    pub fn set_json_document(
        &mut self,
        path: &str,
        kind: crate::document::DocumentKind,
        meta: crate::document::DocumentMeta,
        text: &str,
    ) -> Result<DocId, crate::error::DocumentError> {
        let document = Document::from_json_str(path, kind, meta, text)?;
        Ok(self.set_document(document))
    }

    /// Remove a document. Returns whether it existed.
    pub fn remove_document(&mut self, path: &str) -> bool {
        self.documents.remove(path).is_some()
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    pub fn document_id(&self, path: &str) -> Option<DocId> {
        self.documents.id_of(path)
    }

    /// Drop the derived indices and the graph cache.
    pub fn mark_dirty(&mut self) {
        self.forms = None;
        self.localizations = None;
        self.cache.invalidate();
    }

    fn is_stale(&self) -> bool {
        let generation = self.documents.generation();
        self.forms.as_ref().is_none_or(|f| f.generation() != generation)
            || self
                .localizations
                .as_ref()
                .is_none_or(|l| l.generation() != generation)
    }

    /// Rebuild the form and localization indices from the current documents.
    ///
    /// Called by `analysis()` when the document set has moved on.
    pub fn rebuild_indices(&mut self) {
        // A fresh token is never cancelled.
        let _ = self.rebuild_indices_cancellable(&CancellationToken::new());
    }

    /// Like [`rebuild_indices`](Self::rebuild_indices), giving up when `cancel` fires.
    ///
    /// A cancelled rebuild leaves the indices stale; the next snapshot retries.
    pub fn rebuild_indices_cancellable(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        debug!(
            "[CACHE] rebuilding indices at generation {}",
            self.documents.generation()
        );
        self.forms = None;
        self.localizations = None;
        let view = self.documents.scoped(self.config.scope.clone());
        let edges = self.cache.edges(&view, self.config.parallel);
        let forms = FormIndex::build_cancellable(&view, &edges, cancel)?;
        self.forms = Some(forms);
        self.localizations = Some(LocalizationIndex::build(&view));
        Ok(())
    }

    /// Get a consistent snapshot for querying, rebuilding stale indices first.
    pub fn analysis(&mut self) -> Analysis<'_> {
        if self.is_stale() {
            self.rebuild_indices();
        }
        self.snapshot()
    }

    /// Snapshot whose rebuild and queries all observe `cancel`.
    pub fn analysis_with_cancellation<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Result<Analysis<'a>, Cancelled> {
        if self.is_stale() {
            self.rebuild_indices_cancellable(cancel)?;
        }
        Ok(self.snapshot().with_cancellation(cancel))
    }

    fn snapshot(&mut self) -> Analysis<'_> {
        Analysis {
            source: self.documents.scoped(self.config.scope.clone()),
            config: &self.config,
            cache: &self.cache,
            forms: self.forms.get_or_insert_with(FormIndex::default),
            localizations: self
                .localizations
                .get_or_insert_with(LocalizationIndex::default),
            cancel: None,
        }
    }
}

/// An immutable snapshot of the analysis state.
pub struct Analysis<'a> {
    source: ScopedSource<'a, DocumentSet>,
    config: &'a AnalysisConfig,
    cache: &'a GraphCache,
    forms: &'a FormIndex,
    localizations: &'a LocalizationIndex,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> Analysis<'a> {
    /// Check `token` during graph walks of this snapshot.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    // ==================== Graph ====================

    /// Graph queries over the scoped documents, answered from the host's cache.
    pub fn graph(&self) -> FormGraph<'_, ScopedSource<'a, DocumentSet>> {
        let graph = FormGraph::new(&self.source)
            .with_cache(self.cache)
            .parallel(self.config.parallel);
        match self.cancel {
            Some(token) => graph.with_cancellation(token),
            None => graph,
        }
    }

    /// Blast radius of `doc` for cross-document search.
    pub fn related_documents(&self, doc: DocId, include_self: bool) -> Result<Vec<DocId>, Cancelled> {
        Ok(self
            .graph()
            .find_all_related(doc, include_self)?
            .into_iter()
            .collect())
    }

    // ==================== Forms ====================

    pub fn element(&self, node: NodeRef) -> Option<FormElement<'a>> {
        self.forms.element(node)
    }

    /// Localization keys of an element, one per tree it occurs in, deduplicated.
    pub fn element_keys(&self, node: NodeRef) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for &id in self.forms.instances_of(node) {
            if let Some(key) = self.forms.localization_key(&self.source, id) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        check_expansion(self.forms.issues())
    }

    // ==================== Keys ====================

    pub fn resolve_key(&self, key: &str) -> Resolution {
        SymbolResolver::new(&self.source, self.forms).resolve_key(key)
    }

    pub fn resolve_key_with(&self, key: &str, binder: &dyn FieldBinder) -> Resolution {
        SymbolResolver::new(&self.source, self.forms)
            .with_binder(binder)
            .resolve_key(key)
    }

    /// Every localization entry declaring a fake symbol; the first is the display one.
    pub fn fake_declarations(&self, fake: &FakeSymbol) -> Vec<&'a LocalizationEntry> {
        fake_declarations(fake, self.localizations)
    }

    pub fn find_key_references(&self, element: NodeRef) -> Result<ReferenceResult, Cancelled> {
        find_key_references(
            &self.source,
            self.forms,
            self.localizations,
            Some(self.cache),
            self.cancel,
            element,
        )
    }

    // ==================== Placement ====================

    pub fn find_best_placement(
        &self,
        element: NodeRef,
        target: &LocalizationTarget,
        preferred_file: Option<DocId>,
    ) -> Option<Placement> {
        self.placement_engine()
            .find_best_placement(element, target, preferred_file)
    }

    fn placement_engine(&self) -> PlacementEngine<'_, ScopedSource<'a, DocumentSet>> {
        let engine = PlacementEngine::new(&self.source, self.forms, self.localizations);
        match self.cancel {
            Some(token) => engine.with_cancellation(token),
            None => engine,
        }
    }

    /// Placement for a new entry with this key.
    ///
    /// A key naming an element is placed among its neighbours. A key naming
    /// nothing yet goes under its nearest resolved ancestor (a field, the
    /// group, else the form).
    pub fn place_key(
        &self,
        key: &str,
        locale: Option<&str>,
        preferred_file: Option<DocId>,
    ) -> Option<Placement> {
        let resolution = self.resolve_key(key);
        let root = resolution.form?;
        let target = LocalizationTarget::new(root, locale);
        let engine = self.placement_engine();
        let top = self.forms.tree(root).map(|id| self.forms.instance(id).node);

        if resolution.kind == Some(FormKeyKind::Form) {
            return engine.find_best_placement(top?, &target, preferred_file);
        }
        if let Some(element) = resolution.target().and_then(Symbol::element) {
            return engine.find_best_placement(element, &target, preferred_file);
        }
        let ancestor = resolution
            .fields
            .iter()
            .rev()
            .chain(resolution.group.as_ref())
            .find_map(Symbol::element)
            .or(top)?;
        engine.find_placement_under(ancestor, &target, preferred_file)
    }

    // ==================== Accessors ====================

    pub fn source(&self) -> &ScopedSource<'a, DocumentSet> {
        &self.source
    }

    pub fn forms(&self) -> &'a FormIndex {
        self.forms
    }

    pub fn localizations(&self) -> &'a LocalizationIndex {
        self.localizations
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.source.document(id)
    }
}
