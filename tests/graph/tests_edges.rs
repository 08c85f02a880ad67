//! Direct edge tests for the graph layer.

use crate::helpers::fixtures::*;
use formkey::config::SearchScope;
use formkey::document::{DocumentKind, DocumentSource, Node};
use formkey::graph::{FormGraph, GraphCache};
use rstest::rstest;

// =============================================================================
// DIRECT EDGES
// =============================================================================

#[rstest]
#[case(DocumentKind::Root)]
#[case(DocumentKind::Localization)]
fn test_only_fragments_have_parents(#[case] kind: DocumentKind) {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("m/r.json"), include("x.json")])),
        localization("l10n/m_en.json", "en", &["m.form.r"]),
        fragment("x.json", group("x", vec![])),
    ]);
    let graph = FormGraph::new(&set);
    let doc = set.documents(Some(kind))[0];
    assert!(graph.find_parents(doc).is_empty());
}

#[test]
fn test_diamond_includes_yield_one_child() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("shared.json"), include("shared.json")])),
        fragment("shared.json", group("s", vec![])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let shared = set.id_of("shared.json").unwrap();
    let graph = FormGraph::new(&set);

    let children: Vec<_> = graph.find_children(r).into_iter().collect();
    assert_eq!(children, vec![shared]);
    let parents: Vec<_> = graph.find_parents(shared).into_iter().collect();
    assert_eq!(parents, vec![r]);
}

#[test]
fn test_unresolved_directive_contributes_no_edge() {
    let set = document_set(vec![root(
        "m/r.json",
        "m",
        form(vec![include("missing.json"), optional_include("absent.json")]),
    )]);
    let r = set.id_of("m/r.json").unwrap();
    assert!(FormGraph::new(&set).find_children(r).is_empty());
}

#[test]
fn test_fragment_found_by_path_suffix() {
    let set = document_set(vec![
        root("m/r.json", "m", form(vec![include("common/addr.json")])),
        fragment("forms/common/addr.json", group("addr", vec![])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let addr = set.id_of("forms/common/addr.json").unwrap();
    assert!(FormGraph::new(&set).find_children(r).contains(&addr));
}

// =============================================================================
// CACHE
// =============================================================================

#[test]
fn test_cache_follows_generation() {
    let mut set = document_set(vec![
        root("m/a.json", "m", form(vec![include("f.json")])),
        fragment("f.json", group("f", vec![])),
    ]);
    let cache = GraphCache::new();
    let f = set.id_of("f.json").unwrap();
    assert_eq!(FormGraph::new(&set).with_cache(&cache).find_parents(f).len(), 1);

    set.insert(root("m/b.json", "m", form(vec![include("f.json")])));
    assert_ne!(cache.generation(), Some(set.generation()));
    assert_eq!(FormGraph::new(&set).with_cache(&cache).find_parents(f).len(), 2);
    assert_eq!(cache.generation(), Some(set.generation()));
}

#[test]
fn test_scoped_view_hides_other_artifacts() {
    let set = document_set(vec![
        root_in("m/a.json", "m", "app", form(vec![include("f.json")])),
        root_in("m/b.json", "m", "lib", form(vec![include("f.json")])),
        fragment("f.json", Node::array([])),
    ]);
    let f = set.id_of("f.json").unwrap();
    let a = set.id_of("m/a.json").unwrap();
    let view = set.scoped(SearchScope::Artifact("app".into()));
    let parents: Vec<_> = FormGraph::new(&view).find_parents(f).into_iter().collect();
    assert_eq!(parents, vec![a]);
}

#[test]
fn test_scoped_include_skips_hidden_suffix_match() {
    let set = document_set(vec![
        fragment_in("lib/common/addr.json", "lib", Node::array([field("street")])),
        fragment_in("app/common/addr.json", "app", Node::array([field("street")])),
        root_in("m/r.json", "m", "app", form(vec![flat_include("common/addr.json")])),
    ]);
    let r = set.id_of("m/r.json").unwrap();
    let app = set.id_of("app/common/addr.json").unwrap();
    let view = set.scoped(SearchScope::Artifact("app".into()));

    assert_eq!(view.lookup_fragment("common/addr.json"), Some(app));
    let children: Vec<_> = FormGraph::new(&view).find_children(r).into_iter().collect();
    assert_eq!(children, vec![app]);
}
