//! Recursive directive expansion with an inclusion-stack cycle guard.
//!
//! The element builder walks form documents and calls into this module
//! whenever it meets a value that may be a directive. Each returned item
//! carries the inclusion stack under which it was reached, so nested
//! directives inside spliced content are guarded against the same cycle.

use tracing::debug;

use super::{IncludeDirective, Substitution, directive_at, resolve_fragment, substitute};
use crate::base::{DocId, Name, NodeRef};
use crate::document::DocumentSource;

/// What went wrong while expanding one directive. Never fatal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// The target path matched no fragment.
    Dangling { optional: bool },
    /// A flat include pointed at a fragment whose top node is not an array.
    FlatTargetNotArray,
    /// A single-value include produced an array where one item was expected.
    ArrayInItemPosition,
    /// The fragment is already on the inclusion stack; the branch was dropped.
    CycleTruncated,
}

/// An expansion problem at a directive site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExpansionIssue {
    /// The directive string node.
    pub site: NodeRef,
    /// Target path as written.
    pub path: Name,
    pub kind: IssueKind,
}

/// One item surviving expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expanded {
    /// The concrete, non-directive node.
    pub node: NodeRef,
    /// Outermost directive this item was spliced through, if any.
    pub via: Option<NodeRef>,
    /// Documents on the inclusion path down to `node.doc`, outermost first.
    pub stack: Vec<DocId>,
}

/// Expand an item in an array position.
///
/// Non-directive items are pushed unchanged. A flat directive contributes
/// zero or more spliced items, each re-checked recursively. A single-value
/// directive contributes its fragment's top node, unless that node is an
/// array: an array substituted into an item position never becomes extra
/// siblings.
pub fn expand_item<S: DocumentSource + ?Sized>(
    source: &S,
    item: NodeRef,
    stack: &[DocId],
    out: &mut Vec<Expanded>,
    issues: &mut Vec<ExpansionIssue>,
) {
    expand_item_via(source, item, None, stack, out, issues);
}

fn expand_item_via<S: DocumentSource + ?Sized>(
    source: &S,
    item: NodeRef,
    via: Option<NodeRef>,
    stack: &[DocId],
    out: &mut Vec<Expanded>,
    issues: &mut Vec<ExpansionIssue>,
) {
    let Some(doc) = source.document(item.doc) else {
        return;
    };
    let Some(directive) = directive_at(doc, item.node) else {
        out.push(Expanded {
            node: item,
            via,
            stack: stack.to_vec(),
        });
        return;
    };
    let via = via.or(Some(item));
    let Some((fragment, substitution, inner)) = open(source, item, &directive, stack, issues)
    else {
        return;
    };

    match substitution {
        Substitution::Splice(items) => {
            for node in items {
                expand_item_via(
                    source,
                    NodeRef::new(fragment, node),
                    via,
                    &inner,
                    out,
                    issues,
                );
            }
        }
        Substitution::Replace(top) => {
            if source
                .document(fragment)
                .is_some_and(|frag| frag.is_array(top))
            {
                debug!(
                    "[EXPAND] array fragment '{}' in single item position at {}",
                    directive.target_path(),
                    item
                );
                issues.push(issue(item, &directive, IssueKind::ArrayInItemPosition));
                return;
            }
            expand_item_via(source, NodeRef::new(fragment, top), via, &inner, out, issues);
        }
    }
}

/// Expand a whole property value.
///
/// A directive in value position is replaced by its fragment's top node for
/// both flavours; a flat include additionally requires that top to be an
/// array. Returns `None` when the value cannot be produced.
pub fn expand_value<S: DocumentSource + ?Sized>(
    source: &S,
    value: NodeRef,
    stack: &[DocId],
    issues: &mut Vec<ExpansionIssue>,
) -> Option<Expanded> {
    let doc = source.document(value.doc)?;
    let Some(directive) = directive_at(doc, value.node) else {
        return Some(Expanded {
            node: value,
            via: None,
            stack: stack.to_vec(),
        });
    };
    let (fragment, _, inner) = open(source, value, &directive, stack, issues)?;
    let top = source.document(fragment)?.top();
    let mut expanded = expand_value(source, NodeRef::new(fragment, top), &inner, issues)?;
    expanded.via = Some(value);
    Some(expanded)
}

/// Resolve and substitute one directive, pushing its fragment onto the stack.
fn open<S: DocumentSource + ?Sized>(
    source: &S,
    site: NodeRef,
    directive: &IncludeDirective,
    stack: &[DocId],
    issues: &mut Vec<ExpansionIssue>,
) -> Option<(DocId, Substitution, Vec<DocId>)> {
    let Some(fragment) = resolve_fragment(directive, source) else {
        if !directive.is_optional() {
            debug!(
                "[EXPAND] dangling include '{}' at {}",
                directive.target_path(),
                site
            );
        }
        issues.push(issue(
            site,
            directive,
            IssueKind::Dangling {
                optional: directive.is_optional(),
            },
        ));
        return None;
    };

    if stack.contains(&fragment) || fragment == site.doc {
        debug!(
            "[EXPAND] include cycle through '{}' truncated at {}",
            directive.target_path(),
            site
        );
        issues.push(issue(site, directive, IssueKind::CycleTruncated));
        return None;
    }

    let frag_doc = source.document(fragment)?;
    let substitution = match substitute(directive, frag_doc) {
        Ok(substitution) => substitution,
        Err(err) => {
            debug!("[EXPAND] {} at {}", err, site);
            issues.push(issue(site, directive, IssueKind::FlatTargetNotArray));
            return None;
        }
    };

    let mut inner = stack.to_vec();
    inner.push(fragment);
    Some((fragment, substitution, inner))
}

fn issue(site: NodeRef, directive: &IncludeDirective, kind: IssueKind) -> ExpansionIssue {
    ExpansionIssue {
        site,
        path: Name::new(directive.target_path()),
        kind,
    }
}
