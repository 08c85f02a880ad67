//! IDE features: high-level APIs for editor integrations.
//!
//! This module sits between the semantic model (HIR) and whatever editor
//! layer consumes it.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take data in, return data out
//! 2. **No editor types**: Uses our own types, converted at the boundary
//! 3. **Composable**: Built on top of HIR queries
//!
//! ## Usage
//!
//! The recommended way to use this module is through `AnalysisHost`:
//!
//! ```ignore
//! use formkey::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new();
//! host.set_document(document);
//!
//! let analysis = host.analysis();
//! let references = analysis.find_key_references(element)?;
//! ```

mod analysis;
mod placement;
mod references;

pub use analysis::{Analysis, AnalysisHost};
pub use placement::{LocalizationTarget, Placement, PlacementEngine, PlacementPosition};
pub use references::{KeyReference, ReferenceResult, find_key_references};
