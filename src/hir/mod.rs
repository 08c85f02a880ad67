//! High-level IR (HIR): the semantic model of forms and localizations.
//!
//! Everything here is derived from an immutable document snapshot and tagged
//! with the generation it was built from. Nothing is memoized implicitly;
//! the [`AnalysisHost`](crate::ide::AnalysisHost) decides when to rebuild.
//!
//! ## Key Types
//!
//! - [`FormIndex`]: expanded element trees, one instance per inclusion path
//! - [`KeyChain`]: a tokenized localization key
//! - [`LocalizationIndex`]: every localization entry by key
//! - [`SymbolResolver`]: key chain → module, form, group and field symbols
//! - [`Diagnostic`]: reported expansion problems
//!
//! ## Layers
//!
//! ```text
//! DocumentSource            ← INPUT: documents + fragment lookup
//!     │
//!     ▼
//! EdgeIndex                 ← direct include edges (graph)
//!     │
//!     ▼
//! FormIndex                 ← expanded element trees
//!     │                         LocalizationIndex ← localization files
//!     ▼                             │
//! SymbolResolver  ◄─────────────────┘
//!     │
//!     ▼
//! check_expansion(issues)   ← diagnostics
//! ```

mod diagnostics;
mod elements;
mod keys;
mod localization;
mod resolve;

pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, check_expansion, codes};
pub use elements::{
    ElementInstance, ElementKind, FormElement, FormIndex, InstanceId, SLOT_TABLE, Slot, SlotRule,
    form_key,
};
pub use keys::{FormKeyKind, KeyChain, KeyChainToken, classify};
pub use localization::{LocalizationEntry, LocalizationIndex};
pub use resolve::{
    ExternalFieldHandle, FakeSymbol, FieldBinder, ModuleRef, RealSymbol, Resolution, Symbol,
    SymbolResolver, fake_declarations,
};
