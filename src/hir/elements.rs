//! Form elements: expanded element trees over spliced fragments.
//!
//! A fragment spliced into several places is one set of nodes with several
//! logical positions. The index therefore stores *instances*: one per
//! (node, inclusion path). A [`FormElement`] is the logical view over all
//! instances of one node; its parents and children are unions.
//!
//! The index is built in two phases:
//!
//! 1. Expand every root form, then every fragment no root reaches, into an
//!    instance tree. Directives are resolved on the way; the inclusion stack
//!    guards against cycles.
//! 2. Derive the side tables keyed by node identity.
//!
//! Element kinds come from the property an element sits under, through a
//! single dispatch table ([`SLOT_TABLE`]).

use std::time::Instant;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::base::constants::{
    FORM_TOKEN, PROP_EXPRESSION, PROP_FIELDS, PROP_GROUP_ROWS, PROP_GROUPS, PROP_NAME,
    PROP_REQUEST, PROP_ROWS, PROP_TYPE,
};
use crate::base::{DocId, NodeId, NodeRef};
use crate::document::{Document, DocumentKind, DocumentSource};
use crate::error::Cancelled;
use crate::graph::EdgeIndex;
use crate::include::{Expanded, ExpansionIssue, expand_item, expand_value};

// ============================================================================
// KINDS AND SLOTS
// ============================================================================

/// What a form element is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Top object of a root form.
    Root,
    /// Top node of a fragment that no root form reaches.
    Fragment,
    Group,
    Row,
    Field,
    GroupRow,
    Expression,
    Request,
}

impl ElementKind {
    /// Elements that own a localization key.
    pub fn is_localizable(self) -> bool {
        matches!(self, ElementKind::Root | ElementKind::Group | ElementKind::Field)
    }

    pub fn is_top(self) -> bool {
        matches!(self, ElementKind::Root | ElementKind::Fragment)
    }
}

/// The property an element was found under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The document top.
    Top,
    GroupRows,
    Groups,
    Rows,
    Fields,
    Expression,
    Request,
}

/// One row of the dispatch table.
#[derive(Clone, Copy, Debug)]
pub struct SlotRule {
    pub key: &'static str,
    pub slot: Slot,
    pub kind: ElementKind,
    /// Array of elements (`true`) or a single element value.
    pub many: bool,
}

/// Property name → slot → element kind.
pub const SLOT_TABLE: [SlotRule; 6] = [
    SlotRule {
        key: PROP_GROUP_ROWS,
        slot: Slot::GroupRows,
        kind: ElementKind::GroupRow,
        many: true,
    },
    SlotRule {
        key: PROP_GROUPS,
        slot: Slot::Groups,
        kind: ElementKind::Group,
        many: true,
    },
    SlotRule {
        key: PROP_ROWS,
        slot: Slot::Rows,
        kind: ElementKind::Row,
        many: true,
    },
    SlotRule {
        key: PROP_FIELDS,
        slot: Slot::Fields,
        kind: ElementKind::Field,
        many: true,
    },
    SlotRule {
        key: PROP_EXPRESSION,
        slot: Slot::Expression,
        kind: ElementKind::Expression,
        many: false,
    },
    SlotRule {
        key: PROP_REQUEST,
        slot: Slot::Request,
        kind: ElementKind::Request,
        many: false,
    },
];

impl Slot {
    /// Look up the rule for a property name.
    pub fn rule_for(key: &str) -> Option<&'static SlotRule> {
        SLOT_TABLE.iter().find(|rule| rule.key == key)
    }

    fn rule(self) -> Option<&'static SlotRule> {
        SLOT_TABLE.iter().find(|rule| rule.slot == self)
    }
}

/// Guess the rule for an item of an orphan array fragment, which has no
/// enclosing property to decide its kind.
fn infer_rule(doc: &Document, item: NodeId) -> Option<&'static SlotRule> {
    if doc.string(item).is_some() {
        return Slot::Fields.rule();
    }
    if !doc.is_object(item) {
        return None;
    }
    let has = |key| doc.property(item, key).is_some();
    let slot = if has(PROP_GROUPS) {
        Slot::GroupRows
    } else if has(PROP_ROWS) || has(PROP_GROUP_ROWS) {
        Slot::Groups
    } else if has(PROP_FIELDS) {
        if has(PROP_NAME) { Slot::Groups } else { Slot::Rows }
    } else {
        Slot::Fields
    };
    slot.rule()
}

// ============================================================================
// INSTANCES
// ============================================================================

/// Index of an element instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u32);

impl InstanceId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One logical occurrence of an element node.
#[derive(Clone, Debug)]
pub struct ElementInstance {
    pub node: NodeRef,
    pub kind: ElementKind,
    pub slot: Slot,
    /// Document whose expansion produced this instance.
    pub tree: DocId,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    /// Directive (in the parent's context) this instance was spliced through.
    pub via: Option<NodeRef>,
}

/// All expanded element trees of a document set.
#[derive(Clone, Debug, Default)]
pub struct FormIndex {
    generation: u64,
    instances: Vec<ElementInstance>,
    /// tree document → its top instance, roots first
    trees: IndexMap<DocId, InstanceId>,
    by_node: FxHashMap<NodeRef, Vec<InstanceId>>,
    issues: IndexSet<ExpansionIssue>,
}

impl FormIndex {
    /// Expand every form of `source`.
    pub fn build<S: DocumentSource + ?Sized>(source: &S, edges: &EdgeIndex) -> Self {
        // A fresh token is never cancelled.
        Self::build_cancellable(source, edges, &CancellationToken::new()).unwrap_or_default()
    }

    /// Expand every form of `source`, checking `cancel` at every element.
    pub fn build_cancellable<S: DocumentSource + ?Sized>(
        source: &S,
        edges: &EdgeIndex,
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let start = Instant::now();
        let mut builder = Builder {
            source,
            cancel,
            index: FormIndex {
                generation: source.generation(),
                ..Self::default()
            },
            reached: FxHashSet::default(),
        };

        for root in source.documents(Some(DocumentKind::Root)) {
            builder.build_tree(root, ElementKind::Root)?;
        }

        // Fragments no root reaches: declared orphans first, then cycle-only ones.
        let (orphans, stranded): (Vec<DocId>, Vec<DocId>) = source
            .documents(Some(DocumentKind::Fragment))
            .into_iter()
            .filter(|doc| !builder.reached.contains(doc))
            .partition(|&doc| edges.parents(doc).is_empty());
        for doc in orphans {
            builder.build_tree(doc, ElementKind::Fragment)?;
        }
        for doc in stranded {
            if !builder.reached.contains(&doc) {
                builder.build_tree(doc, ElementKind::Fragment)?;
            }
        }

        let mut index = builder.index;
        index.derive_side_tables();
        info!(
            "[EXPAND] form index: {} trees, {} instances, {} issues, {:?}",
            index.trees.len(),
            index.instances.len(),
            index.issues.len(),
            start.elapsed()
        );
        Ok(index)
    }

    fn derive_side_tables(&mut self) {
        self.by_node.clear();
        for (i, inst) in self.instances.iter().enumerate() {
            self.by_node
                .entry(inst.node)
                .or_default()
                .push(InstanceId(i as u32));
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn instance(&self, id: InstanceId) -> &ElementInstance {
        &self.instances[id.index()]
    }

    /// Top instance of the tree expanded from `doc`.
    pub fn tree(&self, doc: DocId) -> Option<InstanceId> {
        self.trees.get(&doc).copied()
    }

    /// Tree documents, roots first, in build order.
    pub fn trees(&self) -> impl Iterator<Item = DocId> + '_ {
        self.trees.keys().copied()
    }

    /// Every instance of a node, across all trees.
    pub fn instances_of(&self, node: NodeRef) -> &[InstanceId] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Instances of a node inside one tree.
    pub fn instances_in(&self, tree: DocId, node: NodeRef) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances_of(node)
            .iter()
            .copied()
            .filter(move |&id| self.instance(id).tree == tree)
    }

    /// Trees in which a node occurs.
    pub fn trees_containing(&self, node: NodeRef) -> IndexSet<DocId> {
        self.instances_of(node)
            .iter()
            .map(|&id| self.instance(id).tree)
            .collect()
    }

    /// Logical view of a node, if it is an element.
    pub fn element(&self, node: NodeRef) -> Option<FormElement<'_>> {
        (!self.instances_of(node).is_empty()).then_some(FormElement { index: self, node })
    }

    /// Expansion problems met while building, deduplicated.
    pub fn issues(&self) -> impl Iterator<Item = &ExpansionIssue> {
        self.issues.iter()
    }

    // ========================================================================
    // LOGICAL NAVIGATION
    // ========================================================================

    /// Union of parent nodes over all instances (optionally within one tree).
    pub fn logical_parents(&self, node: NodeRef, tree: Option<DocId>) -> IndexSet<NodeRef> {
        self.scoped_instances(node, tree)
            .filter_map(|id| self.instance(id).parent)
            .map(|p| self.instance(p).node)
            .collect()
    }

    /// Union of child nodes over all instances, in declaration order, each once.
    pub fn logical_children(&self, node: NodeRef, tree: Option<DocId>) -> Vec<NodeRef> {
        let mut seen = FxHashSet::default();
        self.scoped_instances(node, tree)
            .flat_map(|id| self.instance(id).children.iter())
            .map(|&c| self.instance(c).node)
            .filter(|n| seen.insert(*n))
            .collect()
    }

    fn scoped_instances(
        &self,
        node: NodeRef,
        tree: Option<DocId>,
    ) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances_of(node)
            .iter()
            .copied()
            .filter(move |&id| tree.is_none_or(|t| self.instance(id).tree == t))
    }

    /// Walk from an instance to its tree top.
    pub fn ancestors(&self, id: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        std::iter::successors(self.instance(id).parent, |&p| self.instance(p).parent)
    }

    // ========================================================================
    // FORM VIEWS
    // ========================================================================

    /// Every group of a root form.
    ///
    /// `groupRows`-derived when the form top declares `groupRows`, otherwise
    /// `groups`-derived; never both. Groups nested in groups are included.
    pub fn all_groups<S: DocumentSource + ?Sized>(&self, source: &S, form: DocId) -> Vec<InstanceId> {
        let Some(top) = self.tree(form) else {
            return Vec::new();
        };
        let top_node = self.instance(top).node;
        let via_rows = source
            .document(top_node.doc)
            .is_some_and(|d| d.property(top_node.node, PROP_GROUP_ROWS).is_some());
        let entry = if via_rows { Slot::GroupRows } else { Slot::Groups };

        let mut out = Vec::new();
        for &child in &self.instance(top).children {
            if self.instance(child).slot == entry {
                self.collect_groups(child, &mut out);
            }
        }
        out
    }

    fn collect_groups(&self, id: InstanceId, out: &mut Vec<InstanceId>) {
        let inst = self.instance(id);
        match inst.kind {
            ElementKind::Group => out.push(id),
            ElementKind::GroupRow => {}
            _ => return,
        }
        for &child in &inst.children {
            if matches!(self.instance(child).slot, Slot::Groups | Slot::GroupRows) {
                self.collect_groups(child, out);
            }
        }
    }

    /// Fields of a group instance, through rows, not entering nested groups.
    pub fn group_fields(&self, group: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut pending: Vec<InstanceId> = self.instance(group).children.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            let inst = self.instance(id);
            match inst.kind {
                ElementKind::Field => out.push(id),
                ElementKind::Row => pending.extend(inst.children.iter().rev().copied()),
                _ => {}
            }
        }
        out
    }

    /// Declared name of an instance's node.
    pub fn name<'s, S: DocumentSource + ?Sized>(&self, source: &'s S, id: InstanceId) -> Option<&'s str> {
        let node = self.instance(id).node;
        let doc = source.document(node.doc)?;
        doc.member_str(node.node, PROP_NAME)
            .or_else(|| doc.string(node.node))
    }

    /// Type reference governing an instance: the nearest `type` on a group or the form top.
    pub fn type_ref<'s, S: DocumentSource + ?Sized>(&self, source: &'s S, id: InstanceId) -> Option<&'s str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&a| {
                matches!(
                    self.instance(a).kind,
                    ElementKind::Group | ElementKind::Root | ElementKind::Fragment
                )
            })
            .find_map(|a| {
                let node = self.instance(a).node;
                source.document(node.doc)?.member_str(node.node, PROP_TYPE)
            })
    }

    /// Localization key of an instance within its tree.
    ///
    /// `<module>.form.<form>` for the top of a root form, `<form key>.<group>`
    /// for groups, `<group key>.<field name>` for fields; `None` otherwise.
    pub fn localization_key<S: DocumentSource + ?Sized>(&self, source: &S, id: InstanceId) -> Option<String> {
        let inst = self.instance(id);
        match inst.kind {
            ElementKind::Root => form_key(source.document(inst.tree)?),
            ElementKind::Group => {
                let form = form_key(source.document(inst.tree)?)?;
                Some(format!("{}.{}", form, self.name(source, id)?))
            }
            ElementKind::Field => {
                let group = self
                    .ancestors(id)
                    .find(|&a| self.instance(a).kind == ElementKind::Group)?;
                let group_key = self.localization_key(source, group)?;
                Some(format!("{}.{}", group_key, self.name(source, id)?))
            }
            _ => None,
        }
    }
}

/// `<module>.form.<name>` of a root form document.
pub fn form_key(doc: &Document) -> Option<String> {
    if doc.kind() != DocumentKind::Root {
        return None;
    }
    Some(format!("{}.{}.{}", doc.module()?, FORM_TOKEN, doc.name()))
}

// ============================================================================
// LOGICAL VIEW
// ============================================================================

/// All instances of one node, seen as a single element.
#[derive(Clone, Copy, Debug)]
pub struct FormElement<'a> {
    index: &'a FormIndex,
    node: NodeRef,
}

impl<'a> FormElement<'a> {
    pub fn node(&self) -> NodeRef {
        self.node
    }

    /// Kind of the first instance. Kinds agree unless a fragment is spliced into unlike slots.
    pub fn kind(&self) -> ElementKind {
        self.index.instance(self.index.instances_of(self.node)[0]).kind
    }

    pub fn instances(&self) -> &'a [InstanceId] {
        self.index.instances_of(self.node)
    }

    pub fn parents(&self) -> IndexSet<NodeRef> {
        self.index.logical_parents(self.node, None)
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.index.logical_children(self.node, None)
    }
}

impl PartialEq for FormElement<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for FormElement<'_> {}

// ============================================================================
// BUILDER
// ============================================================================

struct Builder<'s, S: DocumentSource + ?Sized> {
    source: &'s S,
    cancel: &'s CancellationToken,
    index: FormIndex,
    /// Documents contributing at least one instance so far.
    reached: FxHashSet<DocId>,
}

impl<S: DocumentSource + ?Sized> Builder<'_, S> {
    fn build_tree(&mut self, doc: DocId, kind: ElementKind) -> Result<(), Cancelled> {
        let source = self.source;
        let Some(document) = source.document(doc) else {
            return Ok(());
        };
        let top = NodeRef::new(doc, document.top());
        let stack = [doc];
        let id = self.push(top, kind, Slot::Top, doc, None, None);
        self.index.trees.insert(doc, id);

        if document.is_array(top.node) {
            // Orphan array fragment: no property decides the item kinds.
            let mut items = Vec::new();
            let mut issues = Vec::new();
            for &child in document.children(top.node) {
                expand_item(source, NodeRef::new(doc, child), &stack, &mut items, &mut issues);
            }
            self.index.issues.extend(issues);
            for item in items {
                let rule = source
                    .document(item.node.doc)
                    .and_then(|d| infer_rule(d, item.node.node));
                if let Some(rule) = rule {
                    self.build_item(item, rule, id, doc);
                }
            }
        } else {
            self.expand_members(id, &stack);
        }
        if self.cancel.is_cancelled() {
            trace!("[EXPAND] build of {} cancelled", doc);
            return Err(Cancelled);
        }
        Ok(())
    }

    fn push(
        &mut self,
        node: NodeRef,
        kind: ElementKind,
        slot: Slot,
        tree: DocId,
        parent: Option<InstanceId>,
        via: Option<NodeRef>,
    ) -> InstanceId {
        let id = InstanceId(self.index.instances.len() as u32);
        self.reached.insert(node.doc);
        self.index.instances.push(ElementInstance {
            node,
            kind,
            slot,
            tree,
            parent,
            children: Vec::new(),
            via,
        });
        if let Some(parent) = parent {
            self.index.instances[parent.index()].children.push(id);
        }
        id
    }

    /// Expand the slot properties of an object element.
    fn expand_members(&mut self, id: InstanceId, stack: &[DocId]) {
        if self.cancel.is_cancelled() {
            return;
        }
        let source = self.source;
        let node = self.index.instance(id).node;
        let tree = self.index.instance(id).tree;
        let Some(doc) = source.document(node.doc) else {
            return;
        };
        let mut issues = Vec::new();
        for (key, prop) in doc.properties(node.node) {
            let Some(rule) = Slot::rule_for(key) else {
                continue;
            };
            let Some(value) = doc.property_value(prop) else {
                continue;
            };
            let Some(value) = expand_value(source, NodeRef::new(node.doc, value), stack, &mut issues)
            else {
                continue;
            };

            if !rule.many {
                self.build_item(value, rule, id, tree);
                continue;
            }
            let Some(value_doc) = source.document(value.node.doc) else {
                continue;
            };
            if !value_doc.is_array(value.node.node) {
                trace!("[EXPAND] '{}' at {} is not an array, skipped", key, value.node);
                continue;
            }
            let mut items = Vec::new();
            for &child in value_doc.children(value.node.node) {
                expand_item(
                    source,
                    NodeRef::new(value.node.doc, child),
                    &value.stack,
                    &mut items,
                    &mut issues,
                );
            }
            for mut item in items {
                item.via = item.via.or(value.via);
                self.build_item(item, rule, id, tree);
            }
        }
        self.index.issues.extend(issues);
    }

    fn build_item(&mut self, item: Expanded, rule: &SlotRule, parent: InstanceId, tree: DocId) {
        let source = self.source;
        let Some(doc) = source.document(item.node.doc) else {
            return;
        };
        if doc.is_object(item.node.node) {
            let id = self.push(item.node, rule.kind, rule.slot, tree, Some(parent), item.via);
            self.expand_members(id, &item.stack);
        } else if rule.slot == Slot::Fields && doc.string(item.node.node).is_some() {
            self.push(item.node, rule.kind, rule.slot, tree, Some(parent), item.via);
        }
    }
}
