use std::collections::BTreeMap;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::Serialize;

use super::{LayoutGraph, LayoutOutcome};
use crate::graph::model::Layer;
use crate::util::truncate_label;

const LABEL_CHAR_WIDTH: f32 = 6.2;
const LABEL_MIN_WIDTH: f32 = 22.0;
const LABEL_HEIGHT: f32 = 13.0;
const LABEL_OFFSET: f32 = 8.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LayoutDiagnostics {
    pub visible_nodes: usize,
    pub visible_edges: usize,
    pub per_layer: BTreeMap<String, usize>,
    pub cross_domain_edges: usize,
    pub occupied_pct: f32,
    pub bbox_width: f32,
    pub bbox_height: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub zoom: f32,
    pub label_collisions: usize,
    pub edge_crossings: usize,
    pub collision_iterations: usize,
    pub residual_overlaps: usize,
}

fn label_limit(layer: Layer) -> usize {
    match layer {
        Layer::L1 => 34,
        Layer::L2 => 26,
        Layer::L3 | Layer::L4 => 20,
    }
}

fn label_box(screen: Pos2, node_height: f32, label: &str, layer: Layer) -> Rect {
    let chars = truncate_label(label, label_limit(layer)).chars().count();
    let width = (chars as f32 * LABEL_CHAR_WIDTH).max(LABEL_MIN_WIDTH);
    let top = screen.y + node_height / 2.0 + LABEL_OFFSET;
    Rect::from_min_size(pos2(screen.x - width / 2.0, top), vec2(width, LABEL_HEIGHT))
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    (a.x * b.y) - (a.y * b.x)
}

// Proper crossing strictly inside both segments; touching near the ends does not count.
fn segments_cross(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    let r = a2 - a1;
    let s = b2 - b1;
    let denominator = cross(r, s);
    if denominator.abs() < 1e-6 {
        return false;
    }
    let offset = b1 - a1;
    let t = cross(offset, s) / denominator;
    let u = cross(offset, r) / denominator;
    t > 0.02 && t < 0.98 && u > 0.02 && u < 0.98
}

fn count_label_collisions(boxes: &[Rect]) -> usize {
    let mut collisions = 0;
    for (index, a) in boxes.iter().enumerate() {
        collisions += boxes[index + 1..]
            .iter()
            .filter(|b| a.intersects(**b))
            .count();
    }
    collisions
}

fn count_edge_crossings(graph: &LayoutGraph, screen: &[Pos2]) -> usize {
    let mut crossings = 0;
    for (index, a) in graph.edges.iter().enumerate() {
        for b in &graph.edges[index + 1..] {
            let shares_endpoint = a.source == b.source
                || a.source == b.target
                || a.target == b.source
                || a.target == b.target;
            if shares_endpoint {
                continue;
            }
            if segments_cross(
                screen[a.source],
                screen[a.target],
                screen[b.source],
                screen[b.target],
            ) {
                crossings += 1;
            }
        }
    }
    crossings
}

pub fn compute_diagnostics(
    graph: &LayoutGraph,
    outcome: &LayoutOutcome,
    viewport: Vec2,
) -> LayoutDiagnostics {
    let camera = outcome.density.camera;
    let screen_rect = Rect::from_min_size(Pos2::ZERO, viewport);

    let mut per_layer = Layer::ALL
        .iter()
        .map(|layer| (layer.label().to_owned(), 0))
        .collect::<BTreeMap<_, _>>();
    for node in &graph.nodes {
        *per_layer.entry(node.layer.label().to_owned()).or_default() += 1;
    }

    let screen = graph
        .nodes
        .iter()
        .map(|node| camera.world_to_screen(screen_rect, node.world_pos))
        .collect::<Vec<_>>();
    let labels = graph
        .nodes
        .iter()
        .zip(&screen)
        .map(|(node, position)| {
            label_box(*position, node.size.y * camera.zoom, &node.label, node.layer)
        })
        .collect::<Vec<_>>();

    let bbox = graph.bounding_box();
    let occupied_pct = bbox.map_or(0.0, |bbox| {
        let projected = Rect::from_two_pos(
            camera.world_to_screen(screen_rect, bbox.min.to_vec2()),
            camera.world_to_screen(screen_rect, bbox.max.to_vec2()),
        );
        let visible = projected.intersect(screen_rect);
        let area = (viewport.x * viewport.y).max(1.0);
        if visible.is_positive() {
            visible.area() / area * 100.0
        } else {
            0.0
        }
    });

    LayoutDiagnostics {
        visible_nodes: graph.nodes.len(),
        visible_edges: graph.edges.len(),
        per_layer,
        cross_domain_edges: graph.edges.iter().filter(|edge| edge.cross_domain).count(),
        occupied_pct,
        bbox_width: bbox.map_or(0.0, |bbox| bbox.width()),
        bbox_height: bbox.map_or(0.0, |bbox| bbox.height()),
        canvas_width: outcome.canvas.x,
        canvas_height: outcome.canvas.y,
        zoom: camera.zoom,
        label_collisions: count_label_collisions(&labels),
        edge_crossings: count_edge_crossings(graph, &screen),
        collision_iterations: outcome.collision.iterations,
        residual_overlaps: outcome.collision.residual_overlaps,
    }
}
