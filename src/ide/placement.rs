//! Placement of new localization entries.
//!
//! A new key goes next to the nearest key that already exists for a
//! tree-adjacent element of the same root form and locale. The search walks
//! up through logical parents; at every level it looks at the siblings
//! before the current element (nearest first, deepest last), then the ones
//! after it, then the parent itself. When the tree yields nothing, file-level
//! heuristics pick a file and the entry goes at its end.

use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::base::{DocId, Name, NodeId, NodeRef};
use crate::document::{DocumentKind, DocumentSource};
use crate::hir::{FormIndex, LocalizationIndex, form_key};

/// Which localization the new entry belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalizationTarget {
    /// Root form the key is generated for.
    pub root: DocId,
    pub locale: Option<Name>,
}

impl LocalizationTarget {
    pub fn new(root: DocId, locale: Option<&str>) -> Self {
        Self {
            root,
            locale: locale.map(Name::from),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementPosition {
    Before,
    After,
}

/// Where to insert a new entry.
///
/// Without an anchor, `After` is the end of the file and `Before` its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub file: DocId,
    /// Property node of an existing entry in `file`.
    pub anchor: Option<NodeId>,
    pub position: PlacementPosition,
}

impl Placement {
    pub fn after(file: DocId, anchor: NodeId) -> Self {
        Self {
            file,
            anchor: Some(anchor),
            position: PlacementPosition::After,
        }
    }

    pub fn before(file: DocId, anchor: NodeId) -> Self {
        Self {
            file,
            anchor: Some(anchor),
            position: PlacementPosition::Before,
        }
    }

    pub fn end_of_file(file: DocId) -> Self {
        Self {
            file,
            anchor: None,
            position: PlacementPosition::After,
        }
    }

    pub fn start_of_file(file: DocId) -> Self {
        Self {
            file,
            anchor: None,
            position: PlacementPosition::Before,
        }
    }

    pub fn is_end_of_file(&self) -> bool {
        self.anchor.is_none() && self.position == PlacementPosition::After
    }
}

/// An existing entry found for an element.
#[derive(Clone, Copy)]
struct Anchor {
    file: DocId,
    property: NodeId,
}

pub struct PlacementEngine<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    forms: &'a FormIndex,
    localizations: &'a LocalizationIndex,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, S: DocumentSource + ?Sized> PlacementEngine<'a, S> {
    pub fn new(source: &'a S, forms: &'a FormIndex, localizations: &'a LocalizationIndex) -> Self {
        Self {
            source,
            forms,
            localizations,
            cancel: None,
        }
    }

    /// Check this token at every step of the tree search.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }

    /// Best insertion point for a new entry of `element`.
    ///
    /// With a `preferred_file`, only entries of that file count as anchors and
    /// the result is never `None` unless the search is cancelled. A cancelled
    /// search yields `None` without trying the fallbacks.
    pub fn find_best_placement(
        &self,
        element: NodeRef,
        target: &LocalizationTarget,
        preferred_file: Option<DocId>,
    ) -> Option<Placement> {
        let search = Search {
            engine: self,
            target,
            preferred_file,
        };
        if let Some(placement) = search.in_tree(element) {
            trace!("[PLACE] {} placed at {:?}", element, placement);
            return Some(placement);
        }
        if self.is_cancelled() {
            trace!("[PLACE] {}: cancelled", element);
            return None;
        }
        if let Some(file) = preferred_file {
            trace!("[PLACE] {}: no anchor in preferred {}, end of file", element, file);
            return Some(Placement::end_of_file(file));
        }
        let fallback = self.fallback(target);
        trace!("[PLACE] {}: fallback {:?}", element, fallback);
        fallback
    }

    /// Insertion point for a new key nested under `parent`: after the last
    /// existing entry of its subtree, else after `parent`'s own entry.
    ///
    /// Falls back to [`find_best_placement`](Self::find_best_placement) for `parent`.
    pub fn find_placement_under(
        &self,
        parent: NodeRef,
        target: &LocalizationTarget,
        preferred_file: Option<DocId>,
    ) -> Option<Placement> {
        let search = Search {
            engine: self,
            target,
            preferred_file,
        };
        if let Some(placement) = search.under(parent) {
            return Some(placement);
        }
        if self.is_cancelled() {
            return None;
        }
        self.find_best_placement(parent, target, preferred_file)
    }

    // ========================================================================
    // FALLBACKS
    // ========================================================================

    fn fallback(&self, target: &LocalizationTarget) -> Option<Placement> {
        let locale = target.locale.as_deref();
        let files = self.localizations.files(locale);
        let module = self.source.document(target.root).and_then(|d| d.module());

        // Forms of the same module that already have a localization file.
        for root in self.sibling_roots(target.root) {
            let Some(key) = self.source.document(root).and_then(form_key) else {
                continue;
            };
            if let Some(&file) = files
                .iter()
                .find(|&&f| self.localizations.file_has_prefix(f, &key))
            {
                return Some(Placement::end_of_file(file));
            }
        }

        let name_of = |file: DocId| self.source.document(file).map(|d| d.name());
        let by_module = module.and_then(|m| files.iter().copied().find(|&f| name_of(f) == Some(m)));
        by_module
            .or_else(|| {
                files
                    .iter()
                    .copied()
                    .find(|&f| name_of(f).is_some_and(|n| n.contains("form")))
            })
            .or_else(|| files.first().copied())
            .map(Placement::end_of_file)
    }

    /// `root` itself, then other root forms of its module, same artifact first.
    fn sibling_roots(&self, root: DocId) -> Vec<DocId> {
        let Some(doc) = self.source.document(root) else {
            return Vec::new();
        };
        let Some(module) = doc.module() else {
            return vec![root];
        };
        let mut others: Vec<DocId> = self
            .source
            .documents(Some(DocumentKind::Root))
            .into_iter()
            .filter(|&id| id != root)
            .filter(|&id| {
                self.source
                    .document(id)
                    .is_some_and(|d| d.module() == Some(module))
            })
            .collect();
        // Stable: same-artifact roots move ahead, order otherwise unchanged.
        others.sort_by_key(|&id| {
            self.source
                .document(id)
                .is_none_or(|d| d.artifact() != doc.artifact())
        });
        std::iter::once(root).chain(others).collect()
    }
}

/// One placement query.
struct Search<'e, 'a, S: DocumentSource + ?Sized> {
    engine: &'e PlacementEngine<'a, S>,
    target: &'e LocalizationTarget,
    preferred_file: Option<DocId>,
}

impl<S: DocumentSource + ?Sized> Search<'_, '_, S> {
    fn tree(&self) -> DocId {
        self.target.root
    }

    fn parents(&self, node: NodeRef) -> Vec<NodeRef> {
        self.engine
            .forms
            .logical_parents(node, Some(self.tree()))
            .into_iter()
            .collect()
    }

    fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.engine.forms.logical_children(node, Some(self.tree()))
    }

    /// Existing entry for a node in the target tree and locale.
    fn entry_of(&self, node: NodeRef) -> Option<Anchor> {
        let forms = self.engine.forms;
        forms.instances_in(self.tree(), node).find_map(|id| {
            if !forms.instance(id).kind.is_localizable() {
                return None;
            }
            let key = forms.localization_key(self.engine.source, id)?;
            let entry = self.engine.localizations.find(
                &key,
                self.target.locale.as_deref(),
                self.preferred_file,
            )?;
            Some(Anchor {
                file: entry.file,
                property: entry.property,
            })
        })
    }

    fn in_tree(&self, element: NodeRef) -> Option<Placement> {
        if self.engine.forms.instances_in(self.tree(), element).next().is_none() {
            trace!("[PLACE] {} not in tree {}", element, self.tree());
            return None;
        }
        let mut processed = FxHashSet::default();
        processed.insert(element);

        if self.parents(element).is_empty() {
            // The tree top: only its own subtree is left to look at.
            return self
                .children(element)
                .into_iter()
                .find_map(|child| self.first_in(child, &mut processed))
                .map(|a| Placement::before(a.file, a.property));
        }

        let mut frontier = vec![element];
        while !frontier.is_empty() {
            if self.engine.is_cancelled() {
                return None;
            }
            let mut next = Vec::new();
            for current in frontier {
                for parent in self.parents(current) {
                    if !processed.insert(parent) {
                        continue;
                    }
                    if let Some(placement) = self.around(parent, current, &mut processed) {
                        return Some(placement);
                    }
                    next.push(parent);
                }
            }
            frontier = next;
        }
        None
    }

    fn under(&self, parent: NodeRef) -> Option<Placement> {
        if self.engine.forms.instances_in(self.tree(), parent).next().is_none() {
            return None;
        }
        let mut processed = FxHashSet::default();
        processed.insert(parent);
        for child in self.children(parent).into_iter().rev() {
            if let Some(a) = self.last_in(child, &mut processed) {
                return Some(Placement::after(a.file, a.property));
            }
        }
        self.entry_of(parent)
            .map(|a| Placement::after(a.file, a.property))
    }

    /// Siblings of `current` under `parent`, then `parent` itself.
    fn around(
        &self,
        parent: NodeRef,
        current: NodeRef,
        processed: &mut FxHashSet<NodeRef>,
    ) -> Option<Placement> {
        let siblings = self.children(parent);
        let split = siblings
            .iter()
            .position(|&s| s == current)
            .unwrap_or(siblings.len());

        for &sibling in siblings[..split].iter().rev() {
            if let Some(a) = self.last_in(sibling, processed) {
                return Some(Placement::after(a.file, a.property));
            }
        }
        for &sibling in siblings.iter().skip(split + 1) {
            if let Some(a) = self.first_in(sibling, processed) {
                return Some(Placement::before(a.file, a.property));
            }
        }
        self.entry_of(parent)
            .map(|a| Placement::after(a.file, a.property))
    }

    /// Last entry of a subtree in document order: children last to first, then the node.
    fn last_in(&self, node: NodeRef, processed: &mut FxHashSet<NodeRef>) -> Option<Anchor> {
        if self.engine.is_cancelled() || !processed.insert(node) {
            return None;
        }
        for child in self.children(node).into_iter().rev() {
            if let Some(anchor) = self.last_in(child, processed) {
                return Some(anchor);
            }
        }
        self.entry_of(node)
    }

    /// First entry of a subtree in document order: the node, then its children.
    fn first_in(&self, node: NodeRef, processed: &mut FxHashSet<NodeRef>) -> Option<Anchor> {
        if self.engine.is_cancelled() || !processed.insert(node) {
            return None;
        }
        if let Some(anchor) = self.entry_of(node) {
            return Some(anchor);
        }
        self.children(node)
            .into_iter()
            .find_map(|child| self.first_in(child, processed))
    }
}
