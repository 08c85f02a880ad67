//! # formkey-base
//!
//! Core library for resolving composed form documents and mapping
//! localization keys onto their elements.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → AnalysisHost/Analysis, placement, key references
//!   ↓
//! hir       → Element trees, key chains, symbol resolution, diagnostics
//!   ↓
//! graph     → Include graph queries, caller-owned graph cache
//!   ↓
//! include   → Directive parsing, fragment lookup, substitution
//!   ↓
//! document  → Arena documents, DocumentSet, DocumentSource seam
//!   ↓
//! base      → Primitives (DocId, NodeRef, Name, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → document → include → graph → hir → ide)
// ============================================================================

/// Foundation types: DocId, NodeRef, Name, TextRange
pub mod base;

/// Analysis options: search scope, parallel scans
pub mod config;

/// Error types: cancellation, substitution, document input
pub mod error;

/// Document model: node arena, document set, source capability
pub mod document;

/// Include directives and their substitution
pub mod include;

/// Parent/child adjacency between documents
pub mod graph;

/// High-level IR: form elements, localization keys, symbols
pub mod hir;

/// IDE features: placement, key references, analysis snapshots
pub mod ide;

// Re-export foundation types
pub use base::{DocId, Name, NodeId, NodeRef, TextRange, TextSize};
pub use config::{AnalysisConfig, SearchScope};
pub use document::{Document, DocumentKind, DocumentMeta, DocumentSet, DocumentSource, Node};
pub use error::{Cancelled, DocumentError, SubstitutionError};
