//! Element expansion tests for the HIR layer.

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;
use formkey::document::Node;
use formkey::hir::ElementKind;

fn field_names(host: &mut formkey::ide::AnalysisHost, form: &str, group: &str) -> Vec<String> {
    let analysis = host.analysis();
    let form = doc_id(&analysis, form);
    let forms = analysis.forms();
    forms
        .all_groups(analysis.source(), form)
        .into_iter()
        .filter(|&g| forms.name(analysis.source(), g) == Some(group))
        .flat_map(|g| forms.group_fields(g))
        .filter_map(|f| forms.name(analysis.source(), f).map(str::to_owned))
        .collect()
}

// =============================================================================
// FLAT VS SINGLE-VALUE SUBSTITUTION
// =============================================================================

#[test]
fn test_flat_include_splices_two_siblings() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![group("g", vec![flat_include("ab.json")])])),
        fragment("ab.json", Node::array([Node::string("a"), Node::string("b")])),
    ]);
    assert_eq!(field_names(&mut host, "m/f.json", "g"), vec!["a", "b"]);
}

#[test]
fn test_single_include_of_array_adds_no_siblings() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![group("g", vec![include("ab.json"), field("own")])])),
        fragment("ab.json", Node::array([Node::string("a"), Node::string("b")])),
    ]);
    assert_eq!(field_names(&mut host, "m/f.json", "g"), vec!["own"]);
}

#[test]
fn test_single_include_replaces_directive() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![include("g.json")])),
        fragment("g.json", group("g", vec![field("x")])),
    ]);
    assert_eq!(field_names(&mut host, "m/f.json", "g"), vec!["x"]);
}

#[test]
fn test_nested_flat_includes_are_resolved() {
    let mut host = host(vec![
        root("m/f.json", "m", form(vec![group("g", vec![flat_include("outer.json")])])),
        fragment("outer.json", Node::array([Node::string("a"), flat_include("inner.json")])),
        fragment("inner.json", Node::array([Node::string("b"), Node::string("c")])),
    ]);
    assert_eq!(field_names(&mut host, "m/f.json", "g"), vec!["a", "b", "c"]);
}

#[test]
fn test_slot_value_directive_replaces_value() {
    let mut host = host(vec![
        root("m/f.json", "m", Node::object([("groups", include("groups.json"))])),
        fragment("groups.json", Node::array([group("g", vec![field("x")])])),
    ]);
    assert_eq!(field_names(&mut host, "m/f.json", "g"), vec!["x"]);
}

// =============================================================================
// LOGICAL ELEMENTS
// =============================================================================

#[test]
fn test_fragment_group_in_two_roots() {
    let mut host = host(vec![
        root("m/a.json", "m", form(vec![include("g.json")])),
        root("m/b.json", "m", form(vec![include("g.json")])),
        fragment("g.json", group("g", vec![field("x")])),
    ]);
    let analysis = host.analysis();
    let g = element_for(&analysis, "m.form.a.g");
    let element = analysis.element(g).unwrap();
    assert_eq!(element.kind(), ElementKind::Group);
    assert_eq!(element.instances().len(), 2);
    assert_eq!(element.parents().len(), 2);
    assert_eq!(element.children().len(), 1);

    let mut keys = analysis.element_keys(g);
    keys.sort();
    assert_eq!(keys, vec!["m.form.a.g", "m.form.b.g"]);
}
