use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use crate::classify::Spotlight;
use crate::graph::model::Layer;
use crate::layout::LayoutGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Source,
    Related,
    Dimmed,
}

/// Node and edge indices into a `LayoutGraph` that stay lit. Spotlights have no source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    pub source: Option<usize>,
    pub nodes: BTreeSet<usize>,
    pub edges: BTreeSet<usize>,
}

impl Highlight {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_emphasis(&self, index: usize) -> Emphasis {
        if self.source == Some(index) {
            Emphasis::Source
        } else if self.nodes.contains(&index) {
            Emphasis::Related
        } else {
            Emphasis::Dimmed
        }
    }

    pub fn edge_emphasis(&self, index: usize) -> Emphasis {
        if self.edges.contains(&index) {
            Emphasis::Related
        } else {
            Emphasis::Dimmed
        }
    }
}

fn walk<'g>(start: usize, step: impl Fn(usize) -> &'g [usize]) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &next in step(node) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Full upstream and downstream chain of `selected` over directed visible edges.
///
/// An edge is lit when it was walked: its source is the selection or downstream of it,
/// or its target is the selection or upstream of it.
pub fn chain(graph: &LayoutGraph, selected: usize) -> Highlight {
    if selected >= graph.nodes.len() {
        return Highlight::default();
    }

    let downstream = walk(selected, |index| graph.outgoing(index));
    let upstream = walk(selected, |index| graph.incoming(index));

    let edges = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| {
            edge.source == selected
                || downstream.contains(&edge.source)
                || edge.target == selected
                || upstream.contains(&edge.target)
        })
        .map(|(index, _)| index)
        .collect();

    let mut nodes = downstream;
    nodes.extend(upstream);
    nodes.insert(selected);

    Highlight {
        source: Some(selected),
        nodes,
        edges,
    }
}

pub fn chain_by_id(graph: &LayoutGraph, id: &str) -> Option<Highlight> {
    graph.index_of(id).map(|index| chain(graph, index))
}

pub fn neighborhood(graph: &LayoutGraph, selected: usize) -> Highlight {
    if selected >= graph.nodes.len() {
        return Highlight::default();
    }

    let mut nodes = BTreeSet::from([selected]);
    nodes.extend(graph.outgoing(selected).iter().copied());
    nodes.extend(graph.incoming(selected).iter().copied());

    let edges = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.source == selected || edge.target == selected)
        .map(|(index, _)| index)
        .collect();

    Highlight {
        source: Some(selected),
        nodes,
        edges,
    }
}

/// Visible nodes tagged with `theme`, the L1 anchors of their domains, and the edges among them.
pub fn spotlight(graph: &LayoutGraph, theme: Spotlight) -> Highlight {
    let tagged = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.spotlight == Some(theme))
        .map(|(index, _)| index)
        .collect::<BTreeSet<_>>();
    let domains = tagged
        .iter()
        .map(|&index| graph.nodes[index].domain_key.as_str())
        .collect::<BTreeSet<_>>();

    let mut nodes = tagged;
    nodes.extend(
        graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.layer == Layer::L1 && domains.contains(node.domain_key.as_str()))
            .map(|(index, _)| index),
    );

    let edges = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| nodes.contains(&edge.source) && nodes.contains(&edge.target))
        .map(|(index, _)| index)
        .collect();

    Highlight {
        source: None,
        nodes,
        edges,
    }
}
