//! Foundation types for the formkey toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`DocId`] - Stable document handle inside a document set
//! - [`NodeId`], [`NodeRef`] - Per-document node index and cross-document node identity
//! - [`Name`] - Cheap-to-clone immutable string
//! - [`TextRange`], [`TextSize`] - Offsets inside key strings
//! - Domain constants (directive prefixes, schema property names)
//!
//! This module has NO dependencies on other formkey modules.

pub mod constants;
mod ids;

pub use ids::{DocId, NodeId, NodeRef};

/// Immutable, cheaply cloneable string used for names, keys and paths.
pub type Name = smol_str::SmolStr;

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
