//! Diagnostics: reporting expansion problems.
//!
//! Nothing found while expanding includes is fatal. These diagnostics exist
//! so callers can surface dangling or malformed directives; whether they do
//! is their choice.

use std::sync::Arc;

use crate::base::{DocId, NodeId};
use crate::include::{ExpansionIssue, IssueKind};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A diagnostic anchored on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: DocId,
    /// The directive string node.
    pub node: NodeId,
    pub severity: Severity,
    pub code: &'static str,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn warning(file: DocId, node: NodeId, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            node,
            severity: Severity::Warning,
            code: "",
            message: message.into(),
        }
    }

    pub fn info(file: DocId, node: NodeId, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(file, node, message)
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Codes for expansion diagnostics.
pub mod codes {
    /// Required include with no matching fragment.
    pub const DANGLING_INCLUDE: &str = "W0001";
    /// Flat include of a fragment whose top node is not an array.
    pub const FLAT_TARGET_NOT_ARRAY: &str = "W0002";
    /// Single-value include of an array where one item was expected.
    pub const ARRAY_IN_ITEM_POSITION: &str = "W0003";
    /// Include cycle, truncated.
    pub const INCLUDE_CYCLE: &str = "I0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for a document set.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Report one expansion issue. Optional dangling includes are not reported.
    pub fn expansion_issue(&mut self, issue: &ExpansionIssue) {
        let (file, node) = (issue.site.doc, issue.site.node);
        let diagnostic = match issue.kind {
            IssueKind::Dangling { optional: true } => return,
            IssueKind::Dangling { optional: false } => Diagnostic::warning(
                file,
                node,
                format!("include target '{}' not found", issue.path),
            )
            .with_code(codes::DANGLING_INCLUDE),
            IssueKind::FlatTargetNotArray => Diagnostic::warning(
                file,
                node,
                format!("flat include '{}' does not point at an array", issue.path),
            )
            .with_code(codes::FLAT_TARGET_NOT_ARRAY),
            IssueKind::ArrayInItemPosition => Diagnostic::warning(
                file,
                node,
                format!(
                    "include '{}' yields an array where a single item is expected",
                    issue.path
                ),
            )
            .with_code(codes::ARRAY_IN_ITEM_POSITION),
            IssueKind::CycleTruncated => Diagnostic::info(
                file,
                node,
                format!("include cycle through '{}' ignored", issue.path),
            )
            .with_code(codes::INCLUDE_CYCLE),
        };
        self.add(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Diagnostics of one file.
    pub fn for_file(&self, file: DocId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.file == file)
    }

    /// Take the collected diagnostics, ordered by file then node.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| (d.file, d.node));
        self.diagnostics
    }
}

/// Diagnostics for a batch of expansion issues.
pub fn check_expansion<'a>(issues: impl IntoIterator<Item = &'a ExpansionIssue>) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector::new();
    for issue in issues {
        collector.expansion_issue(issue);
    }
    collector.finish()
}
