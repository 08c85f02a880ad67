//! Diagnostic tests for the HIR layer.

use crate::helpers::fixtures::*;
use formkey::document::Node;
use formkey::hir::{Severity, codes};

#[test]
fn test_required_dangling_include_is_warning() {
    let mut host = host(vec![root("m/f.json", "m", form(vec![include("missing.json")]))]);
    let diagnostics = host.analysis().diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].code, codes::DANGLING_INCLUDE);
}

#[test]
fn test_optional_dangling_include_is_silent() {
    let mut host = host(vec![root("m/f.json", "m", form(vec![optional_include("missing.json")]))]);
    assert!(host.analysis().diagnostics().is_empty());
}

#[test]
fn test_flat_include_of_object_is_warning() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![flat_include("g.json")])),
        fragment("g.json", group("g", vec![])),
    ]);
    let diagnostics = host.analysis().diagnostics();
    assert!(diagnostics.iter().any(|d| d.code == codes::FLAT_TARGET_NOT_ARRAY));
}

#[test]
fn test_cycle_is_info() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![include("a.json")])),
        fragment("a.json", Node::object([("name", Node::string("a")), ("groups", Node::array([include("a.json")]))])),
    ]);
    let diagnostics = host.analysis().diagnostics();
    assert!(diagnostics
        .iter()
        .any(|d| d.severity == Severity::Info && d.code == codes::INCLUDE_CYCLE));
    assert!(diagnostics.iter().all(|d| d.severity != Severity::Error));
}
