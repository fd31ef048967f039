use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::classify::OTHER_DOMAIN;
use crate::graph::model::{Edge, Graph, Layer, Node};

pub const DEFAULT_HOTSPOTS_PER_DOMAIN: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, domain: &str) -> bool {
        self.expanded.contains(domain)
    }

    pub fn toggle(&mut self, domain: &str) -> bool {
        if self.expanded.remove(domain) {
            false
        } else {
            self.expanded.insert(domain.to_owned());
            true
        }
    }

    /// Accordion navigation: every other domain collapses, then the target toggles.
    pub fn select_accordion(&mut self, domain: &str) -> bool {
        self.expanded.retain(|key| key == domain);
        self.toggle(domain)
    }

    pub fn expand_all<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded.extend(domains.into_iter().map(Into::into));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expanded(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct VisibleElements<'a> {
    pub nodes: Vec<&'a Node>,
    pub edges: Vec<&'a Edge>,
}

impl VisibleElements<'_> {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }
}

pub fn select_hotspots<'a>(
    candidates: impl IntoIterator<Item = &'a Node>,
    k: usize,
) -> BTreeMap<&'a str, Vec<&'a Node>> {
    let mut by_domain: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
    for node in candidates {
        if node.layer == Layer::L3 {
            by_domain.entry(node.domain_key.as_str()).or_default().push(node);
        }
    }

    for leaves in by_domain.values_mut() {
        leaves.sort_by(|a, b| {
            b.tightness
                .index
                .cmp(&a.tightness.index)
                .then_with(|| a.id.cmp(&b.id))
        });
        leaves.truncate(k);
    }
    by_domain
}

// Pure visible-set filter. Node order: layer rank, tightness descending, id; edges by id.
pub fn compute_visible_elements<'a>(
    graph: &'a Graph,
    state: &ExpansionState,
    hotspots_per_domain: usize,
) -> VisibleElements<'a> {
    let mut nodes = Vec::new();
    let mut collapsed_leaves = Vec::new();

    for node in &graph.nodes {
        if node.layer == Layer::L1
            || state.is_expanded(&node.domain_key)
            || node.domain_key == OTHER_DOMAIN
        {
            nodes.push(node);
        } else if node.layer == Layer::L3 {
            collapsed_leaves.push(node);
        }
    }

    for hotspots in select_hotspots(collapsed_leaves, hotspots_per_domain).into_values() {
        nodes.extend(hotspots);
    }

    nodes.sort_by(|a, b| {
        a.layer
            .rank()
            .cmp(&b.layer.rank())
            .then_with(|| b.tightness.index.cmp(&a.tightness.index))
            .then_with(|| a.id.cmp(&b.id))
    });

    let ids = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    let mut edges = graph
        .edges
        .iter()
        .filter(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()))
        .collect::<Vec<_>>();
    edges.sort_by(|a, b| a.id.cmp(&b.id));

    VisibleElements { nodes, edges }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DomainChildCounts {
    pub l2: usize,
    pub l3: usize,
}

/// Per-graph cache: hotspot ids for every domain and L2/L3 counts for collapsed-cell badges.
#[derive(Clone, Debug, Default)]
pub struct DisclosureIndex {
    hotspots: BTreeMap<String, Vec<String>>,
    child_counts: BTreeMap<String, DomainChildCounts>,
}

impl DisclosureIndex {
    pub fn build(graph: &Graph, hotspots_per_domain: usize) -> Self {
        let hotspots = select_hotspots(&graph.nodes, hotspots_per_domain)
            .into_iter()
            .map(|(domain, nodes)| {
                (
                    domain.to_owned(),
                    nodes.into_iter().map(|node| node.id.clone()).collect(),
                )
            })
            .collect();

        let mut child_counts: BTreeMap<String, DomainChildCounts> = BTreeMap::new();
        for node in &graph.nodes {
            let counts = match node.layer {
                Layer::L2 | Layer::L3 => child_counts.entry(node.domain_key.clone()).or_default(),
                _ => continue,
            };
            if node.layer == Layer::L2 {
                counts.l2 += 1;
            } else {
                counts.l3 += 1;
            }
        }

        Self {
            hotspots,
            child_counts,
        }
    }

    pub fn hotspots(&self, domain: &str) -> &[String] {
        self.hotspots.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn child_counts(&self, domain: &str) -> DomainChildCounts {
        self.child_counts.get(domain).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_and_clear() {
        let mut state = ExpansionState::new();
        assert!(state.toggle("propulsion"));
        assert!(state.is_expanded("propulsion"));
        assert!(!state.toggle("propulsion"));
        assert!(state.is_empty());

        state.expand_all(["a", "b", "c"]);
        assert_eq!(state.len(), 3);
        state.collapse_all();
        assert!(state.is_empty());
    }

    #[test]
    fn accordion_keeps_at_most_one_domain() {
        let mut state = ExpansionState::new();
        state.expand_all(["a", "b"]);
        assert!(state.select_accordion("c"));
        assert_eq!(state.expanded().collect::<Vec<_>>(), ["c"]);

        assert!(state.select_accordion("a"));
        assert_eq!(state.expanded().collect::<Vec<_>>(), ["a"]);

        assert!(!state.select_accordion("a"));
        assert!(state.is_empty());
    }
}
