mod common;

use chokepoint::classify::Spotlight;
use chokepoint::error::LayoutError;
use chokepoint::highlight::{self, Emphasis};
use chokepoint::session::{Command, Dispatch};
use chokepoint::transition::{Motion, TransitionKind};
use eframe::egui::vec2;
use serde_json::json;

use common::standard;

#[test]
fn commands_during_a_transition_are_deferred_in_order() {
    let mut session = standard().session(vec2(1440.0, 920.0));

    assert_eq!(session.toggle("propulsion").unwrap(), Dispatch::Applied);
    assert!(session.is_animating());
    assert_eq!(session.select("airframe").unwrap(), Dispatch::Deferred);
    assert_eq!(session.collapse_all().unwrap(), Dispatch::Deferred);
    assert_eq!(session.pending(), 2);

    // deferred commands have not touched the expansion state yet
    assert_eq!(session.expansion().expanded().collect::<Vec<_>>(), ["propulsion"]);
    assert_eq!(session.relayout().unwrap_err(), LayoutError::LayoutInProgress);

    assert!(!session.advance(100.0).unwrap());
    assert!(session.advance(400.0).unwrap());
    assert_eq!(session.expansion().expanded().collect::<Vec<_>>(), ["airframe"]);
    assert!(session.is_animating());
    assert_eq!(session.pending(), 1);

    session.settle().unwrap();
    assert!(session.expansion().is_empty());
    assert_eq!(session.pending(), 0);
    assert!(!session.is_animating());
}

#[test]
fn unknown_domains_are_rejected_before_queueing() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    session.toggle("propulsion").unwrap();

    assert_eq!(
        session.toggle("warp_drive"),
        Err(LayoutError::UnknownDomain("warp_drive".to_owned()))
    );
    assert_eq!(session.pending(), 0);
}

#[test]
fn redundant_commands_are_ignored() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    assert_eq!(session.collapse_all().unwrap(), Dispatch::Ignored);
    assert_eq!(
        session.dispatch(Command::Resize(vec2(1440.0, 920.0))).unwrap(),
        Dispatch::Ignored
    );
    assert!(!session.is_animating());
}

#[test]
fn resize_relayouts_without_animating() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    let before = session.domain_cell_bounds()["propulsion"].rect;

    assert_eq!(
        session.dispatch(Command::Resize(vec2(1920.0, 1080.0))).unwrap(),
        Dispatch::Applied
    );
    assert!(!session.is_animating());
    assert_eq!(session.viewport(), vec2(1920.0, 1080.0));
    let cell = &session.domain_cell_bounds()["propulsion"];
    assert!(cell.rect.width() > before.width());
    assert_eq!(cell.label, "Propulsion");
    assert_eq!(cell.tint, "#ffedd5");
    assert!(!cell.expanded);
}

#[test]
fn entering_nodes_grow_out_of_the_domain_anchor() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    session.toggle("propulsion").unwrap();

    let anchor = session
        .layout()
        .node("n_l1_propulsion")
        .map(|node| node.world_pos)
        .unwrap();
    let transition = session.transition().unwrap();
    assert_eq!(transition.kind(), TransitionKind::Expand);
    assert_eq!(transition.duration_ms(), 420.0);
    assert!(transition.entering() > 0);
    assert_eq!(transition.exiting(), 0);

    let frame = transition.frame();
    let entering = frame
        .iter()
        .filter(|node| node.motion == Motion::Entering)
        .collect::<Vec<_>>();
    assert!(entering.iter().any(|node| node.id == "n_l2_propulsion_unit0"));
    for node in entering {
        assert_eq!((node.x, node.y), (anchor.x, anchor.y));
        assert_eq!(node.opacity, 0.0);
    }
}

#[test]
fn exiting_nodes_are_dropped_on_commit() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    session.toggle("propulsion").unwrap();
    session.settle().unwrap();

    session.toggle("propulsion").unwrap();
    let transition = session.transition().unwrap();
    assert_eq!(transition.kind(), TransitionKind::Collapse);
    assert_eq!(transition.duration_ms(), 380.0);
    assert!(transition.exiting() > 0);
    assert!(
        transition
            .frame()
            .iter()
            .any(|node| node.id == "n_l2_propulsion_unit0" && node.opacity == 1.0)
    );

    session.settle().unwrap();
    assert!(session.layout().node("n_l2_propulsion_unit0").is_none());
}

#[test]
fn chain_highlight_walks_both_directions() {
    let mut session = standard().session(vec2(1440.0, 920.0));
    session.select("propulsion").unwrap();
    session.settle().unwrap();

    let layout = session.layout();
    let chain = session.highlight_chain("n_l2_propulsion_unit0").unwrap();
    let lit = |id: &str| chain.nodes.contains(&layout.index_of(id).unwrap());

    assert!(lit("n_l1_propulsion"));
    assert!(lit("n_l3_propulsion_unit0_part2"));
    assert!(lit("acme_motors"));
    assert!(!lit("n_l2_propulsion_unit1"));

    let source = layout.index_of("n_l2_propulsion_unit0").unwrap();
    assert_eq!(chain.node_emphasis(source), Emphasis::Source);
    assert!(session.highlight_chain("not_visible").is_none());

    let focus = highlight::neighborhood(layout, source);
    assert_eq!(focus.nodes.len(), 1 + 1 + 3);
    assert_eq!(focus.edges.len(), 4);
    assert!(!focus.nodes.contains(&layout.index_of("acme_motors").unwrap()));
    let far_edge = layout
        .edges
        .iter()
        .position(|edge| edge.source != source && edge.target != source)
        .unwrap();
    assert_eq!(focus.edge_emphasis(far_edge), Emphasis::Dimmed);
}

#[test]
fn domain_queries_resolve_fuzzily() {
    let session = standard().session(vec2(1440.0, 920.0));
    assert_eq!(session.resolve_domain("airframe").as_deref(), Some("airframe"));
    assert_eq!(session.resolve_domain("Energy Storage").as_deref(), Some("energy_storage"));
    assert_eq!(session.resolve_domain("propul").as_deref(), Some("propulsion"));
    assert_eq!(session.resolve_domain("   "), None);
}

#[test]
fn spotlight_lights_tagged_nodes_and_their_anchors() {
    let mut session = standard()
        .node(json!({
            "id": "n_l3_propulsion_imu",
            "label": "IMU",
            "node_type": "L3",
            "domain": "propulsion",
            "parent_id": "n_l2_propulsion_unit0",
        }))
        .node(json!({
            "id": "n_l3_energy_storage_lidar",
            "label": "Lidar",
            "node_type": "L3",
            "domain": "energy_storage",
            "parent_id": "n_l2_energy_storage_unit0",
        }))
        .link("n_l3_propulsion_imu", "n_l3_energy_storage_lidar", "depends_on")
        .session(vec2(1440.0, 920.0));
    session.expand_all().unwrap();
    session.settle().unwrap();

    let layout = session.layout();
    let sensors = session.spotlight(Spotlight::Sensors);
    let lit = |id: &str| sensors.nodes.contains(&layout.index_of(id).unwrap());

    assert_eq!(sensors.source, None);
    assert_eq!(sensors.nodes.len(), 4);
    assert!(lit("n_l3_propulsion_imu"));
    assert!(lit("n_l3_energy_storage_lidar"));
    assert!(lit("n_l1_propulsion"));
    assert!(lit("n_l1_energy_storage"));
    assert!(!lit("n_l1_airframe"));
    assert!(!lit("n_l2_propulsion_unit0"));

    assert_eq!(sensors.edges.len(), 1);
    let edge = &layout.edges[*sensors.edges.first().unwrap()];
    assert_eq!(layout.nodes[edge.source].id, "n_l3_propulsion_imu");
    let anchor = layout.index_of("n_l1_airframe").unwrap();
    assert_eq!(sensors.node_emphasis(anchor), Emphasis::Dimmed);

    assert!(session.spotlight(Spotlight::CameraPayload).is_empty());
}
