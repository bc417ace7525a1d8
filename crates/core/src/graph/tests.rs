use super::*;
use crate::model::{Edge, EdgeClass, GraphDataset, Relationship, RelationshipKind, Subcategory};
use crate::sample::{SampleShape, generate, subcategory_name};

#[test]
fn scenario_materializes_expected_edge_count() {
    let dataset = generate(SampleShape::default());
    assert_eq!(dataset.categories.len(), 3);
    assert_eq!(dataset.subcategories.len(), 6);
    assert_eq!(dataset.leaves.len(), 30);

    let graph = materialize(&dataset);
    // One category-contains edge per subcategory, not per category.
    assert_eq!(graph.edge_count(), 10 + 6 + 30 + 4);
    assert_eq!(graph.resolved_relationships, 4);
    assert_eq!(graph.dropped_count(), 0);
}

#[test]
fn edge_count_matches_completeness_formula() {
    let dataset = generate(SampleShape {
        categories: 4,
        subcategories_per_category: 3,
        leaves_per_subcategory: 7,
        explicit_edges: 25,
        intra_tier_relationships: 5,
        cross_tier_relationships: 6,
    });
    let members: usize = dataset
        .subcategories
        .iter()
        .map(|s| s.member_node_ids.len())
        .sum();
    let graph = materialize(&dataset);
    assert_eq!(
        graph.edge_count(),
        dataset.edges.len() + dataset.subcategories.len() + members + graph.resolved_relationships
    );
    assert_eq!(graph.resolved_relationships, 11);
}

#[test]
fn classes_are_emitted_in_order() {
    let dataset = generate(SampleShape {
        cross_tier_relationships: 2,
        ..SampleShape::default()
    });
    let graph = materialize(&dataset);
    let classes: Vec<EdgeClass> = graph.edges.iter().map(|e| e.class).collect();
    let mut sorted = classes.clone();
    sorted.sort_by_key(|class| match class {
        EdgeClass::Explicit => 0,
        EdgeClass::CategoryContains => 1,
        EdgeClass::MemberContains => 2,
        EdgeClass::IntraTier => 3,
        EdgeClass::CrossTier => 4,
    });
    assert_eq!(classes, sorted);

    assert_eq!(graph.edges[0].id, "edge-0");
    let first_contains = &graph.edges[10];
    assert_eq!(first_contains.id, "c1-cat-0-to-c2-sub-0-0");
    assert_eq!(first_contains.label, CONTAINS_LABEL);
    let first_member = &graph.edges[16];
    assert_eq!(first_member.id, "c2-sub-0-0-to-node-node-0");
    assert_eq!(first_member.source, "sub-0-0");
    assert_eq!(first_member.target, "node-0");
}

#[test]
fn relationships_resolve_names_to_ids() {
    let dataset = generate(SampleShape::default());
    let graph = materialize(&dataset);
    let rel = graph
        .edges
        .iter()
        .find(|e| e.id == "c2_relationship-0")
        .unwrap();
    assert_eq!(rel.source, "sub-0-0");
    assert_eq!(rel.target, "sub-0-1");
    assert_eq!(rel.class, EdgeClass::IntraTier);
    assert_eq!(rel.label, "depends on");
}

#[test]
fn unresolvable_relationships_are_dropped_and_counted() {
    let mut dataset = generate(SampleShape::default());
    dataset.intra_tier_relationships.push(Relationship::new(
        "bad-from",
        "Nope",
        subcategory_name(0, 0),
        "x",
    ));
    dataset
        .cross_tier_relationships
        .push(Relationship::new("bad-both", "Nope", "Also nope", "x"));

    let graph = materialize(&dataset);
    assert_eq!(graph.edge_count(), 50);
    assert_eq!(
        graph.dropped_relationships,
        vec![
            DroppedRelationship {
                id: "bad-from".to_string(),
                kind: RelationshipKind::IntraTier,
                missing: MissingEndpoint::From,
            },
            DroppedRelationship {
                id: "bad-both".to_string(),
                kind: RelationshipKind::CrossTier,
                missing: MissingEndpoint::Both,
            },
        ]
    );
}

#[test]
fn duplicate_names_are_lenient_by_default_and_fatal_when_strict() {
    let mut dataset = GraphDataset::default();
    dataset
        .subcategories
        .push(Subcategory::new("s1", "Shared", "c1", Vec::new()));
    dataset
        .subcategories
        .push(Subcategory::new("s2", "Shared", "c1", Vec::new()));
    dataset
        .intra_tier_relationships
        .push(Relationship::new("r", "Shared", "Shared", "loop"));

    let graph = materialize(&dataset);
    assert_eq!(graph.duplicate_names, vec!["Shared".to_string()]);
    let rel = graph.edges.iter().find(|e| e.id == "r").unwrap();
    assert_eq!(rel.source, "s2");

    let err = materialize_with(&dataset, MaterializeOptions { strict_names: true }).unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_SUBCATEGORY_NAME");
}

#[test]
fn explicit_edges_are_not_deduplicated() {
    let mut dataset = GraphDataset::default();
    dataset.edges.push(Edge::new("e", "a", "b", "first"));
    dataset.edges.push(Edge::new("e", "a", "b", "second"));
    let graph = materialize(&dataset);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn render_marks_bidirectional_pairs() {
    let edges = vec![
        Edge::new("ab", "a", "b", ""),
        Edge::new("bc", "b", "c", ""),
        Edge::new("ba", "b", "a", ""),
        Edge::new("loop", "c", "c", ""),
    ];
    let graph = project(&[], &[], &[], &edges);
    let by_id = |id: &str| graph.edges.iter().find(|e| e.id == id).unwrap().clone();

    let ab = by_id("ab");
    let ba = by_id("ba");
    assert!(ab.bidirectional && ba.bidirectional);
    assert!(ab.forward);
    assert!(!ba.forward);
    assert_eq!(ab.curve_offset(), BIDIRECTIONAL_CURVE_OFFSET);
    assert_eq!(ba.curve_offset(), -BIDIRECTIONAL_CURVE_OFFSET);

    assert!(!by_id("bc").bidirectional);
    assert_eq!(by_id("bc").curve_offset(), 0.0);
    assert!(!by_id("loop").bidirectional);
}

#[test]
fn forward_compares_joined_keys_when_one_id_prefixes_the_other() {
    let edges = vec![
        Edge::new("short-to-long", "a", "a!", ""),
        Edge::new("long-to-short", "a!", "a", ""),
    ];
    let graph = project(&[], &[], &[], &edges);
    let short_to_long = &graph.edges[0];
    let long_to_short = &graph.edges[1];
    assert!(short_to_long.bidirectional && long_to_short.bidirectional);
    // "a-a!" sorts after "a!-a" because '-' > '!'.
    assert!(!short_to_long.forward);
    assert!(long_to_short.forward);
    assert_eq!(short_to_long.curve_offset(), -BIDIRECTIONAL_CURVE_OFFSET);

    assert!(is_forward("a ", "a"));
    assert!(!is_forward("a", "a "));
    assert!(is_forward("b", "c"));
}

#[test]
fn render_lists_nodes_by_tier() {
    let dataset = generate(SampleShape::default());
    let graph = project(
        &dataset.leaves,
        &dataset.categories,
        &dataset.subcategories,
        &[],
    );
    assert_eq!(graph.nodes.len(), 39);
    assert_eq!(graph.nodes[0].tier, crate::model::Tier::Leaf);
    assert_eq!(graph.nodes[30].tier, crate::model::Tier::Category);
    assert_eq!(graph.nodes[38].tier, crate::model::Tier::Subcategory);
}
