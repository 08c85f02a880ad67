//! Closure and related-form tests for the graph layer.

use crate::helpers::assertions::assert_distinct;
use crate::helpers::fixtures::*;
use formkey::Cancelled;
use formkey::graph::FormGraph;
use tokio_util::sync::CancellationToken;

// =============================================================================
// CYCLE SAFETY
// =============================================================================

#[test]
fn test_self_cycle_terminates() {
    let set = document_set(vec![fragment("a.json", form(vec![include("a.json")]))]);
    let a = set.id_of("a.json").unwrap();
    let graph = FormGraph::new(&set);

    let parents = graph.find_parents_recursive(a).unwrap();
    assert_eq!(parents.into_iter().collect::<Vec<_>>(), vec![a]);
    let children = graph.find_children_recursive(a).unwrap();
    assert_eq!(children.into_iter().collect::<Vec<_>>(), vec![a]);
}

#[test]
fn test_mutual_cycle_terminates_without_duplicates() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("a.json")])),
        fragment("a.json", form(vec![include("b.json")])),
        fragment("b.json", form(vec![include("a.json")])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let a = set.id_of("a.json").unwrap();
    let b = set.id_of("b.json").unwrap();
    let graph = FormGraph::new(&set);

    let parents: Vec<_> = graph.find_parents_recursive(b).unwrap().into_iter().collect();
    assert_distinct(&parents);
    assert!(parents.contains(&a) && parents.contains(&r));

    let children: Vec<_> = graph.find_children_recursive(r).unwrap().into_iter().collect();
    assert_distinct(&children);
    assert_eq!(children.len(), 2);
    assert!(children.contains(&b));

    let roots: Vec<_> = graph.find_topmost_roots(b).unwrap().into_iter().collect();
    assert_eq!(roots, vec![r]);
}

// =============================================================================
// RELATED FORMS
// =============================================================================

#[test]
fn test_related_forms_cover_diamond_once() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("a.json"), include("b.json")])),
        fragment("a.json", form(vec![include("c.json")])),
        fragment("b.json", form(vec![include("c.json")])),
        fragment("c.json", group("c", vec![])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let c = set.id_of("c.json").unwrap();
    let graph = FormGraph::new(&set);

    let related: Vec<_> = graph.find_all_related(r, true).unwrap().into_iter().collect();
    assert_distinct(&related);
    assert_eq!(related.iter().filter(|&&d| d == c).count(), 1);
    assert_eq!(related.len(), 4);

    let from_leaf = graph.find_all_related(c, false).unwrap();
    assert!(!from_leaf.contains(&c));
    assert!(from_leaf.contains(&r));
    assert_eq!(from_leaf.len(), 3);
}

#[test]
fn test_orphan_is_its_own_root() {
    let set = document_set(vec![
        fragment("orphan.json", form(vec![include("leaf.json")])),
        fragment("leaf.json", group("leaf", vec![])),
    ]);
    let orphan = set.id_of("orphan.json").unwrap();
    let leaf = set.id_of("leaf.json").unwrap();
    let related = FormGraph::new(&set).find_all_related(orphan, true).unwrap();
    assert_eq!(related.into_iter().collect::<Vec<_>>(), vec![orphan, leaf]);
}

#[test]
fn test_process_all_related_aborts_on_false() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("a.json"), include("b.json")])),
        fragment("a.json", group("a", vec![])),
        fragment("b.json", group("b", vec![])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let graph = FormGraph::new(&set);

    let mut seen = Vec::new();
    let aborted = graph.process_all_related(r, true, |doc| {
        seen.push(doc);
        seen.len() < 2
    });
    assert!(aborted.is_none());
    assert_eq!(seen.len(), 2);

    let completed = graph.process_all_related(r, true, |_| true);
    assert_eq!(completed.map(|s| s.len()), Some(3));
}

#[test]
fn test_cancellation_unwinds_walks() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("a.json")])),
        fragment("a.json", group("a", vec![])),
    ]);
    let a = set.id_of("a.json").unwrap();
    let token = CancellationToken::new();
    let graph = FormGraph::new(&set).with_cancellation(&token);
    assert!(graph.find_parents_recursive(a).is_ok());

    token.cancel();
    assert_eq!(graph.find_parents_recursive(a), Err(Cancelled));
    assert_eq!(graph.find_all_related(a, true), Err(Cancelled));
}
