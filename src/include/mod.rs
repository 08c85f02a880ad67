//! Include directives: parsing, fragment lookup and substitution.
//!
//! A string value starting with one of four fixed prefixes is an include
//! directive. The directive names a fragment document by relative path;
//! substituting it either replaces the string with the fragment's top node
//! (`json://`) or splices the fragment's array items in its place
//! (`json-flat://`). The `?` variants mark the include as optional.
//!
//! ```text
//! "json://common/address.json"        → single value, required
//! "json?://common/address.json"       → single value, optional
//! "json-flat://common/fields.json"    → splice array items, required
//! "json-flat?://common/fields.json"   → splice array items, optional
//! ```

mod expand;

pub use expand::{Expanded, ExpansionIssue, IssueKind, expand_item, expand_value};

use crate::base::constants::DIRECTIVE_PREFIXES;
use crate::base::{DocId, Name, NodeId};
use crate::document::{Document, DocumentSource};
use crate::error::SubstitutionError;

// ============================================================================
// DIRECTIVE
// ============================================================================

/// A parsed include directive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IncludeDirective {
    /// Path after the prefix, ending in a file name.
    target_path: Name,
    /// A failed lookup is expected and not reported.
    optional: bool,
    /// Splice array items instead of replacing with the top node.
    flat: bool,
}

impl IncludeDirective {
    /// Parse a string value. Returns `None` if no prefix matches or the path is empty.
    pub fn parse(text: &str) -> Option<Self> {
        DIRECTIVE_PREFIXES
            .iter()
            .find_map(|&(prefix, optional, flat)| {
                text.strip_prefix(prefix).map(|path| (path, optional, flat))
            })
            .filter(|(path, _, _)| !path.is_empty() && !path.ends_with('/'))
            .map(|(path, optional, flat)| Self {
                target_path: Name::new(path),
                optional,
                flat,
            })
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// The literal prefix this directive was written with.
    pub fn prefix(&self) -> &'static str {
        DIRECTIVE_PREFIXES
            .iter()
            .find(|&&(_, optional, flat)| optional == self.optional && flat == self.flat)
            .map(|&(prefix, _, _)| prefix)
            .unwrap_or_default()
    }

    /// File name of the target path.
    pub fn file_name(&self) -> &str {
        self.target_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.target_path)
    }
}

/// Parse a string value as an include directive.
pub fn parse_directive(text: &str) -> Option<IncludeDirective> {
    IncludeDirective::parse(text)
}

/// Parse the string node `id` of `doc` as an include directive.
pub fn directive_at(doc: &Document, id: NodeId) -> Option<IncludeDirective> {
    doc.string(id).and_then(IncludeDirective::parse)
}

/// All directives physically present in a document, in arena order.
pub fn directives_in(doc: &Document) -> impl Iterator<Item = (NodeId, IncludeDirective)> + '_ {
    doc.node_ids()
        .filter_map(move |id| directive_at(doc, id).map(|d| (id, d)))
}

/// Look up the fragment a directive points at.
///
/// `None` is a dangling reference; whether that is worth reporting depends
/// on [`IncludeDirective::is_optional`].
pub fn resolve_fragment<S: DocumentSource + ?Sized>(
    directive: &IncludeDirective,
    source: &S,
) -> Option<DocId> {
    source.lookup_fragment(directive.target_path())
}

// ============================================================================
// SUBSTITUTION
// ============================================================================

/// What takes the place of a directive string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Substitution {
    /// Flat include: these fragment nodes become siblings in place of the directive.
    Splice(Vec<NodeId>),
    /// Single-value include: the fragment's top node replaces the directive.
    Replace(NodeId),
}

impl Substitution {
    /// Fragment nodes standing in for the directive.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Substitution::Splice(nodes) => nodes,
            Substitution::Replace(node) => std::slice::from_ref(node),
        }
    }
}

/// Substitute a directive with the content of its fragment.
///
/// Spliced items are returned as-is; an item that is itself a directive is
/// left for the caller to resolve (see [`expand_item`]).
pub fn substitute(
    directive: &IncludeDirective,
    fragment: &Document,
) -> Result<Substitution, SubstitutionError> {
    let top = fragment.top();
    if !directive.is_flat() {
        return Ok(Substitution::Replace(top));
    }
    if fragment.is_array(top) {
        Ok(Substitution::Splice(fragment.children(top).to_vec()))
    } else {
        Err(SubstitutionError::FlatTargetNotArray {
            path: Name::new(fragment.path()),
        })
    }
}
