//! Symbol resolution: mapping localization key chains onto form elements.
//!
//! A key chain is resolved tier by tier:
//!
//! 1. **Module** - token 0 must name a module some document belongs to
//! 2. **Form** - token 2 must name a root form of that module
//! 3. **Group** - token 3 is matched against the form's `all_groups` view
//! 4. **Fields** - the remaining tokens are matched against each field's own
//!    dot-split name, one sub-chain length at a time
//!
//! Only fields can be [`Symbol::Real`] through external binding; everything a
//! key names that has no backing element becomes a [`Symbol::Fake`], declared
//! by the key occurrence itself. Resolution never fails with an error.

use indexmap::IndexSet;
use text_size::TextRange;
use tracing::trace;

use super::elements::{ElementKind, FormIndex, InstanceId};
use super::keys::{FormKeyKind, KeyChain, KeyChainToken};
use super::localization::{LocalizationEntry, LocalizationIndex};
use crate::base::constants::{GROUP_TOKEN_INDEX, KEY_DELIMITER};
use crate::base::{DocId, Name, NodeRef};
use crate::document::{DocumentKind, DocumentSource};

// ============================================================================
// EXTERNAL BINDING
// ============================================================================

/// Opaque handle to a field of an external type, as returned by a [`FieldBinder`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExternalFieldHandle(Name);

impl ExternalFieldHandle {
    pub fn new(id: impl Into<Name>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Binds form fields to members of an external type system.
pub trait FieldBinder: Sync {
    /// Handle for `field_name` on the type named by `type_ref`, if it exists.
    fn bind_field(&self, type_ref: &str, field_name: &str) -> Option<ExternalFieldHandle>;
}

// ============================================================================
// SYMBOLS
// ============================================================================

/// A module named by token 0 of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub name: Name,
}

/// An element backed by the form tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RealSymbol {
    pub element: NodeRef,
    /// Root form the element was reached from.
    pub root: DocId,
    pub kind: ElementKind,
    pub binding: Option<ExternalFieldHandle>,
}

/// A name declared by the localization key itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FakeSymbol {
    /// The token text.
    pub name: Name,
    /// Key text up to and including the declaring token.
    pub key_prefix: Name,
    /// Range of the declaring token in the key occurrence.
    pub declared_at: TextRange,
    pub token_index: usize,
    pub root: Option<DocId>,
    /// Form element carrying the name, when there is one without external binding.
    pub element: Option<NodeRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Real(RealSymbol),
    Fake(FakeSymbol),
}

impl Symbol {
    pub fn is_real(&self) -> bool {
        matches!(self, Symbol::Real(_))
    }

    pub fn is_fake(&self) -> bool {
        matches!(self, Symbol::Fake(_))
    }

    /// Underlying form element, if any.
    pub fn element(&self) -> Option<NodeRef> {
        match self {
            Symbol::Real(real) => Some(real.element),
            Symbol::Fake(fake) => fake.element,
        }
    }

    pub fn root(&self) -> Option<DocId> {
        match self {
            Symbol::Real(real) => Some(real.root),
            Symbol::Fake(fake) => fake.root,
        }
    }

    pub fn as_fake(&self) -> Option<&FakeSymbol> {
        match self {
            Symbol::Fake(fake) => Some(fake),
            Symbol::Real(_) => None,
        }
    }
}

/// Everything a key resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub chain: KeyChain,
    pub kind: Option<FormKeyKind>,
    pub module: Option<ModuleRef>,
    pub form: Option<DocId>,
    pub group: Option<Symbol>,
    pub fields: Vec<Symbol>,
}

impl Resolution {
    /// The symbol the whole key names: the last field, else the group.
    pub fn target(&self) -> Option<&Symbol> {
        self.fields.last().or(self.group.as_ref())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Query-time resolver over one expanded form index.
pub struct SymbolResolver<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    forms: &'a FormIndex,
    binder: Option<&'a dyn FieldBinder>,
}

impl<'a, S: DocumentSource + ?Sized> SymbolResolver<'a, S> {
    pub fn new(source: &'a S, forms: &'a FormIndex) -> Self {
        Self {
            source,
            forms,
            binder: None,
        }
    }

    /// Bind fields through `binder`; without one every field symbol is fake.
    pub fn with_binder(mut self, binder: &'a dyn FieldBinder) -> Self {
        self.binder = Some(binder);
        self
    }

    /// Resolve `key` through every tier.
    pub fn resolve_key(&self, key: &str) -> Resolution {
        self.resolve_chain(&KeyChain::parse(key))
    }

    pub fn resolve_chain(&self, chain: &KeyChain) -> Resolution {
        let kind = chain.classify();
        let mut resolution = Resolution {
            chain: chain.clone(),
            kind,
            module: None,
            form: None,
            group: None,
            fields: Vec::new(),
        };
        if kind.is_none() {
            return resolution;
        }
        resolution.module = self.resolve_module(chain);
        resolution.form = resolution
            .module
            .as_ref()
            .and_then(|module| self.resolve_form(chain, module));
        resolution.group = self.resolve_group(chain, resolution.form);
        resolution.fields = self.resolve_field_chain(chain, resolution.form);
        resolution
    }

    /// The module named by token 0, if any document belongs to it.
    pub fn resolve_module(&self, chain: &KeyChain) -> Option<ModuleRef> {
        let name = chain.module().filter(|m| !m.is_empty())?;
        let known = self
            .source
            .documents(None)
            .into_iter()
            .filter_map(|id| self.source.document(id))
            .any(|doc| doc.module() == Some(name));
        trace!("[RESOLVE] module '{}': {}", name, known);
        known.then(|| ModuleRef { name: name.into() })
    }

    /// The root form of `module` named by token 2.
    pub fn resolve_form(&self, chain: &KeyChain, module: &ModuleRef) -> Option<DocId> {
        let name = chain.form()?;
        self.source
            .documents(Some(DocumentKind::Root))
            .into_iter()
            .find(|&id| {
                self.source
                    .document(id)
                    .is_some_and(|doc| doc.module() == Some(module.name.as_str()) && doc.name() == name)
            })
    }

    /// The group named by token 3.
    ///
    /// `None` when the key has no group token. Without a matching group of the
    /// form the result is a fake declared at that token.
    pub fn resolve_group(&self, chain: &KeyChain, form: Option<DocId>) -> Option<Symbol> {
        let token = chain.token(GROUP_TOKEN_INDEX)?;
        let found = form.and_then(|root| {
            self.groups_named(root, &token.text)
                .first()
                .map(|&id| (root, self.forms.instance(id).node))
        });
        Some(match found {
            Some((root, element)) => Symbol::Real(RealSymbol {
                element,
                root,
                kind: ElementKind::Group,
                binding: None,
            }),
            None => {
                trace!("[RESOLVE] group '{}' not found, fake", token.text);
                Symbol::Fake(fake_at(chain, token, form, None))
            }
        })
    }

    /// One symbol or more per field token, in token order.
    ///
    /// Several symbols for one token occur when distinct fields share the
    /// name or a name prefix. Symbols are deduplicated by element and root.
    pub fn resolve_field_chain(&self, chain: &KeyChain, form: Option<DocId>) -> Vec<Symbol> {
        let tokens = chain.field_tokens();
        if tokens.is_empty() {
            return Vec::new();
        }

        let fields = match (form, chain.group()) {
            (Some(root), Some(group)) => self.candidate_fields(root, group),
            _ => Vec::new(),
        };

        let mut out = IndexSet::new();
        for (depth, token) in tokens.iter().enumerate() {
            let sub: Vec<&str> = tokens[..=depth].iter().map(|t| t.text.as_ref()).collect();
            let exact: Vec<&Candidate<'_>> = fields.iter().filter(|f| f.chain == sub).collect();
            let matched = if exact.is_empty() {
                fields
                    .iter()
                    .filter(|f| f.chain.len() > sub.len() && f.chain.starts_with(&sub))
                    .collect()
            } else {
                exact
            };

            if matched.is_empty() {
                trace!("[RESOLVE] field token '{}' unmatched, fake", token.text);
                out.insert(Symbol::Fake(fake_at(chain, token, form, None)));
                continue;
            }
            for candidate in matched {
                out.insert(self.field_symbol(chain, token, candidate));
            }
        }
        out.into_iter().collect()
    }

    /// Group instances of `root` whose name is `name`.
    fn groups_named(&self, root: DocId, name: &str) -> Vec<InstanceId> {
        self.forms
            .all_groups(self.source, root)
            .into_iter()
            .filter(|&id| self.forms.name(self.source, id) == Some(name))
            .collect()
    }

    fn candidate_fields(&self, root: DocId, group: &str) -> Vec<Candidate<'a>> {
        let mut seen = IndexSet::new();
        let mut out = Vec::new();
        for group in self.groups_named(root, group) {
            for field in self.forms.group_fields(group) {
                let node = self.forms.instance(field).node;
                if !seen.insert(node) {
                    continue;
                }
                let Some(name) = self.forms.name(self.source, field) else {
                    continue;
                };
                out.push(Candidate {
                    instance: field,
                    root,
                    name,
                    chain: name.split(KEY_DELIMITER).collect(),
                });
            }
        }
        out
    }

    fn field_symbol(&self, chain: &KeyChain, token: &KeyChainToken, candidate: &Candidate<'_>) -> Symbol {
        let element = self.forms.instance(candidate.instance).node;
        let binding = self.binder.and_then(|binder| {
            let type_ref = self.forms.type_ref(self.source, candidate.instance)?;
            binder.bind_field(type_ref, candidate.name)
        });
        match binding {
            Some(binding) => Symbol::Real(RealSymbol {
                element,
                root: candidate.root,
                kind: ElementKind::Field,
                binding: Some(binding),
            }),
            None => Symbol::Fake(fake_at(chain, token, Some(candidate.root), Some(element))),
        }
    }
}

/// A field seen as a resolution candidate.
struct Candidate<'a> {
    instance: InstanceId,
    root: DocId,
    name: &'a str,
    chain: Vec<&'a str>,
}

fn fake_at(
    chain: &KeyChain,
    token: &KeyChainToken,
    root: Option<DocId>,
    element: Option<NodeRef>,
) -> FakeSymbol {
    FakeSymbol {
        name: Name::from(token.text.as_ref()),
        key_prefix: chain.prefix(token.index).unwrap_or_default().into(),
        declared_at: token.range,
        token_index: token.index,
        root,
        element,
    }
}

/// Every localization entry declaring `fake`: keys sharing its prefix up to its token.
///
/// Document order; the first entry is the one to display.
pub fn fake_declarations<'l>(fake: &FakeSymbol, localizations: &'l LocalizationIndex) -> Vec<&'l LocalizationEntry> {
    localizations
        .entries()
        .filter(|entry| entry.chain.prefix(fake.token_index) == Some(fake.key_prefix.as_str()))
        .collect()
}
