mod common;

use std::collections::BTreeSet;

use chokepoint::classify::OTHER_DOMAIN;
use chokepoint::disclosure::{DisclosureIndex, ExpansionState, compute_visible_elements};
use chokepoint::graph::model::Layer;
use serde_json::json;

use common::{Fixture, standard};

fn visible_ids(graph: &chokepoint::graph::Graph, state: &ExpansionState) -> BTreeSet<String> {
    compute_visible_elements(graph, state, 2)
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .collect()
}

#[test]
fn collapsed_domain_shows_its_two_tightest_leaves() {
    let graph = Fixture::new()
        .scored_leaves("propulsion", &[90, 10, 20, 80, 5, 70, 60, 40, 30, 15])
        .graph();
    let visible = compute_visible_elements(&graph, &ExpansionState::new(), 2);

    let mut leaf_scores = visible
        .nodes
        .iter()
        .filter(|node| node.layer == Layer::L3)
        .map(|node| node.tightness.index)
        .collect::<Vec<_>>();
    leaf_scores.sort_unstable();
    assert_eq!(leaf_scores, [80, 90]);
    assert!(visible.nodes.iter().all(|node| node.layer != Layer::L2));

    let index = DisclosureIndex::build(&graph, 2);
    assert_eq!(
        index.hotspots("propulsion"),
        ["n_l3_propulsion_leaf0", "n_l3_propulsion_leaf3"]
    );
    assert_eq!(index.child_counts("propulsion").l3, 10);
}

#[test]
fn hotspot_ties_break_by_id() {
    let graph = Fixture::new()
        .scored_leaves("airframe", &[50, 50, 50])
        .graph();
    let index = DisclosureIndex::build(&graph, 2);
    assert_eq!(
        index.hotspots("airframe"),
        ["n_l3_airframe_leaf0", "n_l3_airframe_leaf1"]
    );
}

#[test]
fn accordion_navigation_swaps_the_expanded_domain() {
    let graph = standard().graph();
    let mut state = ExpansionState::new();

    state.select_accordion("propulsion");
    let first = visible_ids(&graph, &state);
    assert!(first.contains("n_l2_propulsion_unit0"));
    assert!(first.contains("acme_motors"));

    state.select_accordion("airframe");
    let second = visible_ids(&graph, &state);
    assert!(second.contains("n_l2_airframe_unit2"));
    assert!(!second.contains("n_l2_propulsion_unit0"));
    assert_eq!(state.expanded().collect::<Vec<_>>(), ["airframe"]);
}

#[test]
fn expanding_never_hides_anything() {
    let graph = standard().graph();
    let collapsed = visible_ids(&graph, &ExpansionState::new());

    for domain in graph.domain_keys() {
        let mut state = ExpansionState::new();
        state.toggle(&domain);
        let expanded = visible_ids(&graph, &state);
        assert!(
            collapsed.is_subset(&expanded),
            "expanding {domain} hid {:?}",
            collapsed.difference(&expanded).collect::<Vec<_>>()
        );
    }

    let mut everything = ExpansionState::new();
    everything.expand_all(graph.domain_keys());
    assert_eq!(visible_ids(&graph, &everything).len(), graph.node_count());
}

#[test]
fn visible_edges_only_join_visible_nodes() {
    let graph = standard().graph();
    let mut state = ExpansionState::new();
    for step in ["propulsion", "energy_storage", "airframe"] {
        state.toggle(step);
        let visible = compute_visible_elements(&graph, &state, 2);
        for edge in &visible.edges {
            assert!(visible.contains(&edge.source), "{} dangles", edge.id);
            assert!(visible.contains(&edge.target), "{} dangles", edge.id);
        }
    }
}

#[test]
fn other_domain_is_always_visible() {
    let graph = standard()
        .node(json!({ "id": "loose_part", "node_type": "L3" }))
        .node(json!({ "id": "loose_note", "node_type": "note" }))
        .graph();
    let visible = visible_ids(&graph, &ExpansionState::new());

    assert_eq!(graph.node("loose_part").map(|node| node.domain_key.as_str()), Some(OTHER_DOMAIN));
    assert!(visible.contains("loose_part"));
    assert!(visible.contains("loose_note"));
}

#[test]
fn reset_restores_the_collapsed_view() {
    let graph = standard().graph();
    let initial = visible_ids(&graph, &ExpansionState::new());

    let mut state = ExpansionState::new();
    state.expand_all(graph.domain_keys());
    state.collapse_all();
    assert_eq!(visible_ids(&graph, &state), initial);
}
