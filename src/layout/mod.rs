mod cell;
mod collision;
pub mod diagnostics;
pub mod grid;
pub mod viewport;

use std::collections::{BTreeMap, HashMap};

use eframe::egui::{Rect, Vec2, vec2};
use serde::Serialize;
use tracing::debug;

use crate::classify::Spotlight;
use crate::config::LayoutConfig;
use crate::disclosure::{ExpansionState, VisibleElements};
use crate::error::LayoutError;
use crate::graph::model::{Layer, NodeKind, RelationType};

pub use collision::CollisionReport;
pub use grid::{CellSlot, DomainCell, DomainCells};
pub use viewport::{Camera, DensityAdjustment, DensityOutcome};

use collision::CollisionScratch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Normal,
    CollapsedAnchor,
    Hotspot,
}

#[derive(Clone, Debug)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    pub domain_key: String,
    pub layer: Layer,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub spotlight: Option<Spotlight>,
    pub tightness: u8,
    pub tier: u8,
    pub size: Vec2,
    pub world_pos: Vec2,
    pub state: NodeState,
}

#[derive(Clone, Debug)]
pub struct LayoutEdge {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub relation: RelationType,
    pub cross_domain: bool,
}

#[derive(Default)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    index_by_id: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    scratch: CollisionScratch,
}

impl LayoutGraph {
    pub fn from_visible(visible: &VisibleElements<'_>) -> Self {
        let mut graph = Self::default();
        graph.rebuild(visible);
        graph
    }

    // Replaces the node/edge set. Nodes that survive keep their last position.
    pub fn rebuild(&mut self, visible: &VisibleElements<'_>) {
        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node.world_pos))
            .collect::<HashMap<_, _>>();

        self.nodes = visible
            .nodes
            .iter()
            .map(|node| LayoutNode {
                id: node.id.clone(),
                label: node.label.clone(),
                domain_key: node.domain_key.clone(),
                layer: node.layer,
                kind: node.kind.clone(),
                parent_id: node.parent_id.clone(),
                spotlight: node.spotlight,
                tightness: node.tightness.index,
                tier: node.tightness.tier,
                size: vec2(node.geometry.width, node.geometry.height),
                world_pos: prior.remove(&node.id).unwrap_or(Vec2::ZERO),
                state: NodeState::Normal,
            })
            .collect();

        self.index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        self.edges = visible
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *self.index_by_id.get(&edge.source)?;
                let target = *self.index_by_id.get(&edge.target)?;
                Some(LayoutEdge {
                    id: edge.id.clone(),
                    source,
                    target,
                    relation: edge.relation,
                    cross_domain: false,
                })
            })
            .collect();

        self.outgoing = vec![Vec::new(); self.nodes.len()];
        self.incoming = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            self.outgoing[edge.source].push(edge.target);
            self.incoming[edge.target].push(edge.source);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn outgoing(&self, index: usize) -> &[usize] {
        &self.outgoing[index]
    }

    pub fn incoming(&self, index: usize) -> &[usize] {
        &self.incoming[index]
    }

    pub fn positions(&self) -> BTreeMap<String, Vec2> {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.world_pos))
            .collect()
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(|node| Rect::from_center_size(node.world_pos.to_pos2(), node.size))
            .reduce(|a, b| a.union(b))
    }

    fn flag_cross_domain_edges(&mut self) {
        for edge in &mut self.edges {
            edge.cross_domain =
                self.nodes[edge.source].domain_key != self.nodes[edge.target].domain_key;
        }
    }
}

#[derive(Clone, Debug)]
pub struct LayoutOutcome {
    pub cells: DomainCells,
    pub collision: CollisionReport,
    pub density: DensityOutcome,
    pub canvas: Vec2,
}

impl LayoutOutcome {
    fn empty(canvas: Vec2) -> Self {
        Self {
            cells: DomainCells::new(),
            collision: CollisionReport {
                converged: true,
                ..CollisionReport::default()
            },
            density: viewport::idle_outcome(),
            canvas,
        }
    }
}

/// Grid placement, collision relaxation and density tuning for the current visible set.
///
/// Idempotent for a fixed (node set, edge set, expansion state, viewport). Fails only when a
/// node ends up without a computed cell.
pub fn run_layout(
    graph: &mut LayoutGraph,
    expansion: &ExpansionState,
    viewport: Vec2,
    config: &LayoutConfig,
) -> Result<LayoutOutcome, LayoutError> {
    let canvas = config.grid.canvas_for(viewport);
    if graph.is_empty() {
        return Ok(LayoutOutcome::empty(canvas));
    }

    let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, node) in graph.nodes.iter().enumerate() {
        members.entry(node.domain_key.clone()).or_default().push(index);
    }
    let demand = members
        .iter()
        .map(|(key, indices)| {
            let mut demand = grid::CellDemand::default();
            for &index in indices {
                demand.add(graph.nodes[index].size);
            }
            (key.clone(), demand)
        })
        .collect::<BTreeMap<_, _>>();

    let cells = grid::compute_cells(&demand, expansion, canvas, config);
    for (key, indices) in &members {
        if let Some(cell) = cells.get(key) {
            cell::place_cell(&mut graph.nodes, indices, cell, config.grid.overflow_pitch);
        }
    }
    graph.flag_cross_domain_edges();

    let bounds = graph
        .nodes
        .iter()
        .map(|node| {
            cells
                .get(&node.domain_key)
                .map(|cell| cell.rect)
                .ok_or_else(|| LayoutError::MissingDomainCell {
                    node: node.id.clone(),
                    domain: node.domain_key.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let collision = collision::resolve_collisions(
        &mut graph.nodes,
        &bounds,
        &config.collision,
        &mut graph.scratch,
    );

    let density = match graph.bounding_box() {
        Some(bbox) => viewport::tune_viewport(bbox, viewport, &config.density),
        None => viewport::idle_outcome(),
    };

    debug!(
        nodes = graph.nodes.len(),
        cells = cells.len(),
        iterations = collision.iterations,
        converged = collision.converged,
        zoom = density.camera.zoom,
        "layout complete"
    );

    Ok(LayoutOutcome {
        cells,
        collision,
        density,
        canvas,
    })
}

/// Every node footprint lies inside its cell. Nodes larger than their cell only need a
/// contained center.
pub fn is_contained(graph: &LayoutGraph, cells: &DomainCells) -> bool {
    graph.nodes.iter().all(|node| {
        cells.get(&node.domain_key).is_some_and(|cell| {
            let inner = cell.rect.shrink2(node.size / 2.0);
            let bounds = if inner.is_positive() {
                inner.expand(0.01)
            } else {
                cell.rect
            };
            bounds.contains(node.world_pos.to_pos2())
        })
    })
}
