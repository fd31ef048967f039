use std::cmp::Ordering;

use serde::Serialize;

use super::model::{Graph, Layer, Node};

// Tightness descending, then layer rank, then id.
pub fn compare_tightness_desc(a: &Node, b: &Node) -> Ordering {
    b.tightness
        .index
        .cmp(&a.tightness.index)
        .then_with(|| a.layer.rank().cmp(&b.layer.rank()))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn top_bottlenecks(graph: &Graph, limit: usize) -> Vec<&Node> {
    let mut ranked = graph
        .nodes
        .iter()
        .filter(|node| node.is_core_component())
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| compare_tightness_desc(a, b));
    ranked.truncate(limit);
    ranked
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub l1: usize,
    pub l2: usize,
    pub l3: usize,
    pub companies: usize,
    pub evidence: usize,
    pub edges: usize,
    pub tier3: usize,
}

pub fn summarize(graph: &Graph) -> GraphSummary {
    let mut summary = GraphSummary {
        edges: graph.edge_count(),
        ..GraphSummary::default()
    };

    for node in &graph.nodes {
        if node.kind.is_company() {
            summary.companies += 1;
            continue;
        }
        if node.kind.is_evidence() {
            summary.evidence += 1;
            continue;
        }
        match node.layer {
            Layer::L1 => summary.l1 += 1,
            Layer::L2 => summary.l2 += 1,
            Layer::L3 => summary.l3 += 1,
            Layer::L4 => {}
        }
        if node.is_core_component() && node.tightness.tier == 3 {
            summary.tier3 += 1;
        }
    }

    summary
}
