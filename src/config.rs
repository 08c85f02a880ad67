//! Analysis configuration

use crate::base::Name;

/// Which documents an analysis may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// Every document in the set.
    #[default]
    Workspace,
    /// Only documents whose `artifact` equals the given name, plus documents
    /// that declare no artifact at all.
    Artifact(Name),
}

impl SearchScope {
    /// Check whether a document with the given artifact is visible.
    pub fn admits(&self, artifact: Option<&str>) -> bool {
        match self {
            SearchScope::Workspace => true,
            SearchScope::Artifact(name) => artifact.is_none_or(|a| a == name.as_str()),
        }
    }
}

/// Options for graph queries and index builds
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Visibility restriction applied to document enumeration
    pub scope: SearchScope,
    /// Scan documents on the rayon pool when building whole-set indices
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scope: SearchScope::Workspace,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Configuration restricted to one artifact.
    pub fn for_artifact(artifact: impl Into<Name>) -> Self {
        Self {
            scope: SearchScope::Artifact(artifact.into()),
            ..Self::default()
        }
    }
}
