//! Placement tests: tree-adjacent anchors first, file heuristics after.

use crate::helpers::assertions::*;
use crate::helpers::fixtures::*;
use formkey::document::Node;
use formkey::ide::{LocalizationTarget, Placement};
use tokio_util::sync::CancellationToken;

// =============================================================================
// TREE SEARCH
// =============================================================================

#[test]
fn test_parent_entry_is_the_anchor() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f", "m.form.f.g1"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let file = doc_id(&analysis, "l10n/m_en.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");

    let placement =
        analysis.find_best_placement(field1, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(
        placement,
        Some(Placement::after(file, property_for(&analysis, file, "m.form.f.g1")))
    );
}

#[test]
fn test_following_sibling_beats_parent() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f", "m.form.f.g1.field2"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let file = doc_id(&analysis, "l10n/m_en.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");

    let placement =
        analysis.find_best_placement(field1, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(
        placement,
        Some(Placement::before(file, property_for(&analysis, file, "m.form.f.g1.field2")))
    );
}

#[test]
fn test_preceding_subtree_gives_its_deepest_last_entry() {
    let mut host = host(vec![
        root(
            "m/f.json",
            "m",
            form(vec![
                group("g1", vec![field("field1"), field("field2")]),
                group("g2", vec![field("field3")]),
            ]),
        ),
        localization("l10n/m_en.json", "en", &["m.form.f.g1", "m.form.f.g1.field2"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let file = doc_id(&analysis, "l10n/m_en.json");
    let field3 = element_for(&analysis, "m.form.f.g2.field3");

    let placement =
        analysis.find_best_placement(field3, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(
        placement,
        Some(Placement::after(file, property_for(&analysis, file, "m.form.f.g1.field2")))
    );
}

#[test]
fn test_tree_top_goes_before_first_descendant() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f.g1.field1"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let file = doc_id(&analysis, "l10n/m_en.json");
    let tree = analysis.forms().tree(root).expect("root tree");
    let top = analysis.forms().instance(tree).node;

    let placement =
        analysis.find_best_placement(top, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(
        placement,
        Some(Placement::before(file, property_for(&analysis, file, "m.form.f.g1.field1")))
    );
}

#[test]
fn test_other_locale_entries_are_ignored() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_de.json", "de", &["m.form.f.g1"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");

    let placement =
        analysis.find_best_placement(field1, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(placement, None);
}

#[test]
fn test_spliced_field_uses_neighbours_under_every_parent() {
    let mut host = host(vec![
        root(
            "m/f.json",
            "m",
            form(vec![
                group("g1", vec![flat_include("shared/x.json"), field("a")]),
                group("g2", vec![field("b"), flat_include("shared/x.json")]),
            ]),
        ),
        fragment("shared/x.json", Node::array([field("x")])),
        localization("l10n/m_en.json", "en", &["m.form.f", "m.form.f.g2.b"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let file = doc_id(&analysis, "l10n/m_en.json");
    let x = element_for(&analysis, "m.form.f.g1.x");
    assert_eq!(x.doc, doc_id(&analysis, "shared/x.json"));
    assert_eq!(analysis.forms().logical_parents(x, Some(root)).len(), 2);

    let placement =
        analysis.find_best_placement(x, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(
        placement,
        Some(Placement::after(file, property_for(&analysis, file, "m.form.f.g2.b")))
    );
}

// =============================================================================
// PREFERRED FILE
// =============================================================================

#[test]
fn test_preferred_file_without_anchor_is_end_of_file() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f.g1"]),
        localization("l10n/extra_en.json", "en", &[]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let extra = doc_id(&analysis, "l10n/extra_en.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");

    let placement = analysis.find_best_placement(
        field1,
        &LocalizationTarget::new(root, Some("en")),
        Some(extra),
    );

    assert_eq!(placement, Some(Placement::end_of_file(extra)));
}

#[test]
fn test_preferred_file_restricts_anchors() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/a_en.json", "en", &["m.form.f.g1.field2"]),
        localization("l10n/b_en.json", "en", &["m.form.f.g1"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let a = doc_id(&analysis, "l10n/a_en.json");
    let b = doc_id(&analysis, "l10n/b_en.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");
    let target = LocalizationTarget::new(root, Some("en"));

    assert_eq!(
        analysis.find_best_placement(field1, &target, None),
        Some(Placement::before(a, property_for(&analysis, a, "m.form.f.g1.field2")))
    );
    assert_eq!(
        analysis.find_best_placement(field1, &target, Some(b)),
        Some(Placement::after(b, property_for(&analysis, b, "m.form.f.g1")))
    );
}

// =============================================================================
// FALLBACKS
// =============================================================================

#[test]
fn test_fallback_to_file_of_sibling_form() {
    let mut host = host(vec![
        simple_form(),
        root("m/other.json", "m", form(vec![group("g", vec![])])),
        localization("l10n/m_en.json", "en", &[]),
        localization("l10n/custom_en.json", "en", &["m.form.other.g"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let custom = doc_id(&analysis, "l10n/custom_en.json");
    let field1 = element_for(&analysis, "m.form.f.g1.field1");

    let placement =
        analysis.find_best_placement(field1, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(placement, Some(Placement::end_of_file(custom)));
}

#[test]
fn test_fallback_prefers_same_artifact() {
    let mut host = host(vec![
        root_in("m/f.json", "m", "app", form(vec![group("g1", vec![field("x")])])),
        root_in("m/o1.json", "m", "lib", form(vec![])),
        root_in("m/o2.json", "m", "app", form(vec![])),
        localization("l10n/lib_en.json", "en", &["m.form.o1.g"]),
        localization("l10n/app_en.json", "en", &["m.form.o2.g"]),
    ]);
    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    let app = doc_id(&analysis, "l10n/app_en.json");
    let x = element_for(&analysis, "m.form.f.g1.x");

    let placement =
        analysis.find_best_placement(x, &LocalizationTarget::new(root, Some("en")), None);

    assert_eq!(placement, Some(Placement::end_of_file(app)));
}

#[test]
fn test_fallback_by_file_name() {
    let names = [
        (vec!["l10n/misc_en.json", "l10n/forms_en.json", "l10n/m.json"], "l10n/m.json"),
        (vec!["l10n/misc_en.json", "l10n/forms_en.json"], "l10n/forms_en.json"),
        (vec!["l10n/misc_en.json"], "l10n/misc_en.json"),
    ];
    for (files, expected) in names {
        let mut docs = vec![simple_form()];
        docs.extend(files.iter().map(|path| localization(path, "en", &[])));
        let mut host = host(docs);
        let analysis = host.analysis();
        let root = doc_id(&analysis, "m/f.json");
        let field1 = element_for(&analysis, "m.form.f.g1.field1");

        let placement =
            analysis.find_best_placement(field1, &LocalizationTarget::new(root, Some("en")), None);

        assert_eq!(
            placement,
            Some(Placement::end_of_file(doc_id(&analysis, expected))),
            "files {:?}",
            files
        );
    }
}

// =============================================================================
// PLACE KEY
// =============================================================================

#[test]
fn test_place_existing_field_key() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f.g1.field2"]),
    ]);
    let analysis = host.analysis();
    let file = doc_id(&analysis, "l10n/m_en.json");

    assert_eq!(
        analysis.place_key("m.form.f.g1.field1", Some("en"), None),
        Some(Placement::before(file, property_for(&analysis, file, "m.form.f.g1.field2")))
    );
}

#[test]
fn test_place_new_field_key_under_group() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f", "m.form.f.g1.field1"]),
    ]);
    let analysis = host.analysis();
    let file = doc_id(&analysis, "l10n/m_en.json");

    assert_eq!(
        analysis.place_key("m.form.f.g1.newfield", Some("en"), None),
        Some(Placement::after(file, property_for(&analysis, file, "m.form.f.g1.field1")))
    );
}

#[test]
fn test_place_key_of_unknown_form() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f"]),
    ]);
    let analysis = host.analysis();

    assert_eq!(analysis.place_key("m.form.nothere.g", Some("en"), None), None);
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[test]
fn test_cancelled_snapshot_skips_placement_and_fallbacks() {
    let mut host = host(vec![
        simple_form(),
        localization("l10n/m_en.json", "en", &["m.form.f.g1"]),
    ]);
    let (root, file, field1) = {
        let analysis = host.analysis();
        (
            doc_id(&analysis, "m/f.json"),
            doc_id(&analysis, "l10n/m_en.json"),
            element_for(&analysis, "m.form.f.g1.field1"),
        )
    };
    let token = CancellationToken::new();
    token.cancel();

    let analysis = host.analysis_with_cancellation(&token).unwrap();
    let target = LocalizationTarget::new(root, Some("en"));

    assert_eq!(analysis.find_best_placement(field1, &target, None), None);
    assert_eq!(analysis.find_best_placement(field1, &target, Some(file)), None);
}

#[test]
fn test_cancelled_rebuild_leaves_host_stale() {
    let mut host = host(vec![simple_form()]);
    let token = CancellationToken::new();
    token.cancel();

    assert!(host.analysis_with_cancellation(&token).is_err());

    let analysis = host.analysis();
    let root = doc_id(&analysis, "m/f.json");
    assert!(analysis.forms().tree(root).is_some());
}
