#![allow(dead_code)]

use chokepoint::graph::model::Graph;
use chokepoint::graph::{build_graph, parse_dataset};
use chokepoint::{EngineConfig, GraphSession};
use eframe::egui::Vec2;
use serde_json::{Value, json};

/// Builder for small hierarchy datasets in the loader's JSON shape.
#[derive(Default)]
pub struct Fixture {
    nodes: Vec<Value>,
    edges: Vec<Value>,
    overrides: Vec<Value>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// One L1 anchor, `subsystems` L2 nodes under it and `leaves` L3 nodes under each L2.
    pub fn domain(mut self, key: &str, subsystems: usize, leaves: usize) -> Self {
        let anchor = format!("n_l1_{key}");
        self.nodes.push(json!({
            "id": anchor,
            "label": format!("{key} root"),
            "node_type": "L1",
        }));
        for sub in 0..subsystems {
            let subsystem = format!("n_l2_{key}_unit{sub}");
            self.nodes.push(json!({
                "id": subsystem,
                "label": format!("{key} unit {sub}"),
                "node_type": "L2",
                "domain": key,
                "parent_id": anchor,
            }));
            self.edge(&anchor, &subsystem, "decomposes_to");
            for leaf in 0..leaves {
                let part = format!("n_l3_{key}_unit{sub}_part{leaf}");
                self.nodes.push(json!({
                    "id": part,
                    "label": format!("part {sub}.{leaf}"),
                    "node_type": "L3",
                    "domain": key,
                    "parent_id": subsystem,
                }));
                self.edge(&subsystem, &part, "decomposes_to");
            }
        }
        self
    }

    /// One L2 with an L3 per score; each score is an authoritative override.
    pub fn scored_leaves(mut self, key: &str, scores: &[u8]) -> Self {
        let anchor = format!("n_l1_{key}");
        let subsystem = format!("n_l2_{key}_scored");
        self.nodes.push(json!({ "id": anchor, "node_type": "L1" }));
        self.nodes.push(json!({
            "id": subsystem,
            "node_type": "L2",
            "domain": key,
            "parent_id": anchor,
        }));
        self.edge(&anchor, &subsystem, "decomposes_to");
        for (index, score) in scores.iter().enumerate() {
            let part = format!("n_l3_{key}_leaf{index}");
            self.nodes.push(json!({
                "id": part,
                "node_type": "L3",
                "domain": key,
                "parent_id": subsystem,
            }));
            self.edge(&subsystem, &part, "decomposes_to");
            self.overrides.push(json!({ "node_id": part, "score": score }));
        }
        self
    }

    pub fn company(mut self, id: &str, supplies: &[&str]) -> Self {
        self.nodes.push(json!({ "id": id, "label": id, "node_type": "company" }));
        for target in supplies {
            self.edge(target, id, "supplied_by");
        }
        self
    }

    pub fn node(mut self, node: Value) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn link(mut self, source: &str, target: &str, relation: &str) -> Self {
        self.edge(source, target, relation);
        self
    }

    fn edge(&mut self, source: &str, target: &str, relation: &str) {
        self.edges.push(json!({
            "source": source,
            "target": target,
            "relation_type": relation,
        }));
    }

    pub fn json(&self) -> String {
        json!({
            "nodes": self.nodes,
            "edges": self.edges,
            "tightness_overrides": self.overrides,
        })
        .to_string()
    }

    pub fn graph(&self) -> Graph {
        let dataset = parse_dataset(&self.json()).expect("fixture parses");
        build_graph(&dataset, &EngineConfig::default())
    }

    pub fn session(&self, viewport: Vec2) -> GraphSession {
        GraphSession::new(self.graph(), EngineConfig::default(), viewport)
            .expect("initial layout succeeds")
    }
}

/// Three curated domains, one company and a couple of cross-domain dependencies.
pub fn standard() -> Fixture {
    Fixture::new()
        .domain("propulsion", 2, 3)
        .domain("energy_storage", 2, 2)
        .domain("airframe", 3, 2)
        .company("acme_motors", &["n_l3_propulsion_unit0_part0", "n_l3_propulsion_unit1_part1"])
        .link(
            "n_l3_propulsion_unit0_part1",
            "n_l3_energy_storage_unit0_part0",
            "depends_on",
        )
        .link("n_l2_airframe_unit0", "n_l2_propulsion_unit1", "depends_on")
}
