use std::collections::HashMap;

use eframe::egui::{Rect, Vec2, vec2};

use super::grid::{DomainCell, overflow_columns, wrap_pitch};
use super::{LayoutNode, NodeState};
use crate::graph::model::Layer;
use crate::util::{lerp, spread_fraction, stable_offset};

const COLLAPSED_ANCHOR_Y: f32 = 0.42;
const HOTSPOT_ROW_Y: f32 = 0.65;
const HOTSPOT_SPREAD: f32 = 0.28;

const EXPANDED_ANCHOR_Y: f32 = 0.12;
const L2_ROW_Y: f32 = 0.34;
const L2_MARGIN: f32 = 0.08;
const L3_TOP: f32 = 0.48;
const L3_BOTTOM: f32 = 0.90;
const ORPHAN_MARGIN: f32 = 0.10;
const SATELLITE_ROW_Y: f32 = 0.94;
const SATELLITE_MARGIN: f32 = 0.12;
const COMPANY_ROW_Y: f32 = 0.96;
const COMPANY_MARGIN: f32 = 0.15;

pub(super) fn place_cell(nodes: &mut [LayoutNode], members: &[usize], cell: &DomainCell, pitch: f32) {
    if cell.slot.is_overflow() {
        place_wrapped(nodes, members, cell.rect, pitch);
    } else if cell.expanded {
        place_expanded(nodes, members, cell.rect);
    } else {
        place_collapsed(nodes, members, cell.rect);
    }
}

fn at(rect: Rect, x_fraction: f32, y_fraction: f32) -> Vec2 {
    vec2(
        rect.min.x + rect.width() * x_fraction,
        rect.min.y + rect.height() * y_fraction,
    )
}

fn spread_x(rect: Rect, margin: f32, index: usize, count: usize) -> f32 {
    let inset = rect.width() * margin;
    lerp(
        rect.min.x + inset,
        rect.max.x - inset,
        spread_fraction(index, count),
    )
}

fn place_collapsed(nodes: &mut [LayoutNode], members: &[usize], rect: Rect) {
    let hotspots = members
        .iter()
        .copied()
        .filter(|&index| nodes[index].layer != Layer::L1)
        .collect::<Vec<_>>();
    let spread = rect.width() * HOTSPOT_SPREAD;
    let center_x = rect.center().x;

    for &index in members {
        let node = &mut nodes[index];
        if node.layer == Layer::L1 {
            node.world_pos = at(rect, 0.5, COLLAPSED_ANCHOR_Y);
            node.state = NodeState::CollapsedAnchor;
        }
    }

    for (slot, &index) in hotspots.iter().enumerate() {
        let node = &mut nodes[index];
        let fraction = spread_fraction(slot, hotspots.len());
        node.world_pos = vec2(
            center_x - spread + spread * 2.0 * fraction,
            rect.min.y + rect.height() * HOTSPOT_ROW_Y + stable_offset(&node.id, "_hy", 6.0),
        );
        node.state = if node.layer == Layer::L3 {
            NodeState::Hotspot
        } else {
            NodeState::Normal
        };
    }
}

fn place_expanded(nodes: &mut [LayoutNode], members: &[usize], rect: Rect) {
    let mut anchors = Vec::new();
    let mut subsystems = Vec::new();
    let mut leaves = Vec::new();
    let mut satellites = Vec::new();
    let mut companies = Vec::new();
    for &index in members {
        let node = &nodes[index];
        match node.layer {
            Layer::L1 => anchors.push(index),
            Layer::L2 => subsystems.push(index),
            Layer::L3 => leaves.push(index),
            Layer::L4 if node.kind.is_company() => companies.push(index),
            Layer::L4 => satellites.push(index),
        }
    }

    for &index in &anchors {
        nodes[index].world_pos = at(rect, 0.5, EXPANDED_ANCHOR_Y);
        nodes[index].state = NodeState::Normal;
    }

    let mut column_of = HashMap::with_capacity(subsystems.len());
    for (slot, &index) in subsystems.iter().enumerate() {
        let x = spread_x(rect, L2_MARGIN, slot, subsystems.len());
        nodes[index].world_pos = vec2(x, rect.min.y + rect.height() * L2_ROW_Y);
        nodes[index].state = NodeState::Normal;
        column_of.insert(nodes[index].id.clone(), x);
    }

    place_leaves(nodes, &leaves, &subsystems, &column_of, rect);

    for (slot, &index) in satellites.iter().enumerate() {
        let node = &mut nodes[index];
        node.world_pos = vec2(
            spread_x(rect, SATELLITE_MARGIN, slot, satellites.len())
                + stable_offset(&node.id, "", 4.0),
            rect.min.y + rect.height() * SATELLITE_ROW_Y + stable_offset(&node.id, "y", 6.0),
        );
        node.state = NodeState::Normal;
    }

    for (slot, &index) in companies.iter().enumerate() {
        let node = &mut nodes[index];
        node.world_pos = vec2(
            spread_x(rect, COMPANY_MARGIN, slot, companies.len())
                + stable_offset(&node.id, "", 5.0),
            rect.min.y + rect.height() * COMPANY_ROW_Y + stable_offset(&node.id, "cy", 8.0),
        );
        node.state = NodeState::Normal;
    }
}

// L3 columns under their parent L2, orphans along the bottom band; square packing without L2.
fn place_leaves(
    nodes: &mut [LayoutNode],
    leaves: &[usize],
    subsystems: &[usize],
    column_of: &HashMap<String, f32>,
    rect: Rect,
) {
    if leaves.is_empty() {
        return;
    }

    let top = rect.min.y + rect.height() * L3_TOP;
    let bottom = rect.min.y + rect.height() * L3_BOTTOM;

    if subsystems.is_empty() {
        let columns = (leaves.len() as f32).sqrt().ceil().max(1.0) as usize;
        let rows = leaves.len().div_ceil(columns);
        for (slot, &index) in leaves.iter().enumerate() {
            let node = &mut nodes[index];
            node.world_pos = vec2(
                spread_x(rect, L2_MARGIN, slot % columns, columns),
                lerp(top, bottom, spread_fraction(slot / columns, rows)),
            );
            node.state = NodeState::Normal;
        }
        return;
    }

    let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut orphans = Vec::new();
    for &index in leaves {
        match nodes[index].parent_id.as_deref() {
            Some(parent) if column_of.contains_key(parent) => {
                by_parent.entry(parent).or_default().push(index)
            }
            _ => orphans.push(index),
        }
    }

    let mut placements = Vec::with_capacity(leaves.len());
    for &subsystem in subsystems {
        let parent = nodes[subsystem].id.as_str();
        let Some(children) = by_parent.get(parent) else {
            continue;
        };
        let column_x = column_of[parent];
        for (slot, &index) in children.iter().enumerate() {
            let id = &nodes[index].id;
            placements.push((
                index,
                vec2(
                    column_x + stable_offset(id, "_l3x", 8.0),
                    lerp(top, bottom, spread_fraction(slot, children.len())),
                ),
            ));
        }
    }

    for (slot, &index) in orphans.iter().enumerate() {
        let id = &nodes[index].id;
        placements.push((
            index,
            vec2(
                spread_x(rect, ORPHAN_MARGIN, slot, orphans.len()),
                bottom + stable_offset(id, "_oy", 8.0),
            ),
        ));
    }

    for (index, position) in placements {
        nodes[index].world_pos = position;
        nodes[index].state = NodeState::Normal;
    }
}

fn place_wrapped(nodes: &mut [LayoutNode], members: &[usize], rect: Rect, pitch: f32) {
    let largest = members
        .iter()
        .fold(Vec2::ZERO, |largest, &index| largest.max(nodes[index].size));
    let step = wrap_pitch(pitch, largest);
    let per_row = overflow_columns(rect.width(), step.x);
    for (slot, &index) in members.iter().enumerate() {
        let node = &mut nodes[index];
        node.world_pos = vec2(
            rect.min.x + (slot % per_row) as f32 * step.x + step.x / 2.0,
            rect.min.y + (slot / per_row) as f32 * step.y + step.y / 2.0,
        );
        node.state = NodeState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::graph::model::NodeKind;
    use crate::layout::grid::CellSlot;

    fn node(id: &str, layer: Layer, parent: Option<&str>) -> LayoutNode {
        LayoutNode {
            id: id.to_owned(),
            label: id.to_owned(),
            domain_key: "airframe".to_owned(),
            layer,
            kind: NodeKind::DomainComponent,
            parent_id: parent.map(str::to_owned),
            spotlight: None,
            tightness: 50,
            tier: 1,
            size: vec2(20.0, 20.0),
            world_pos: Vec2::ZERO,
            state: NodeState::Normal,
        }
    }

    fn cell(expanded: bool) -> DomainCell {
        DomainCell {
            key: "airframe".to_owned(),
            rect: Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 100.0)),
            expanded,
            label: "Airframe".to_owned(),
            tint: "#dcfce7".to_owned(),
            slot: CellSlot::Grid { row: 0, column: 0 },
        }
    }

    #[test]
    fn collapsed_cell_centers_anchor_and_rows_hotspots() {
        let mut nodes = vec![
            node("n_l1_airframe", Layer::L1, None),
            node("a", Layer::L3, None),
            node("b", Layer::L3, None),
        ];
        place_cell(&mut nodes, &[0, 1, 2], &cell(false), 40.0);

        assert_eq!(nodes[0].world_pos, vec2(100.0, 42.0));
        assert_eq!(nodes[0].state, NodeState::CollapsedAnchor);
        assert_eq!(nodes[1].world_pos.x, 100.0 - 56.0);
        assert_eq!(nodes[2].world_pos.x, 100.0 + 56.0);
        assert!((nodes[1].world_pos.y - 65.0).abs() <= 3.0);
        assert_eq!(nodes[2].state, NodeState::Hotspot);
    }

    #[test]
    fn expanded_leaves_hang_under_their_parent() {
        let mut nodes = vec![
            node("n_l1_airframe", Layer::L1, None),
            node("wing", Layer::L2, None),
            node("tail", Layer::L2, None),
            node("spar", Layer::L3, Some("tail")),
            node("loose", Layer::L3, Some("missing")),
        ];
        place_cell(&mut nodes, &[0, 1, 2, 3, 4], &cell(true), 40.0);

        assert_eq!(nodes[0].world_pos, vec2(100.0, 12.0));
        assert_eq!(nodes[1].world_pos, vec2(16.0, 34.0));
        assert_eq!(nodes[2].world_pos, vec2(184.0, 34.0));
        assert!((nodes[3].world_pos.x - 184.0).abs() <= 4.0);
        assert_eq!(nodes[3].world_pos.y, 69.0);
        assert_eq!(nodes[4].world_pos.x, 100.0);
        assert!((nodes[4].world_pos.y - 90.0).abs() <= 4.0);
    }

    #[test]
    fn wrapped_rows_step_by_the_tallest_member() {
        let mut nodes = (0..3)
            .map(|index| node(&format!("extra{index}"), Layer::L3, None))
            .collect::<Vec<_>>();
        nodes[1].size = vec2(92.0, 92.0);
        let overflow = DomainCell {
            rect: Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 224.0)),
            slot: CellSlot::Overflow { index: 0 },
            ..cell(false)
        };
        place_cell(&mut nodes, &[0, 1, 2], &overflow, 40.0);

        assert_eq!(nodes[0].world_pos, vec2(46.0, 46.0));
        assert_eq!(nodes[1].world_pos, vec2(138.0, 46.0));
        assert_eq!(nodes[2].world_pos, vec2(46.0, 138.0));
    }

    #[test]
    fn leaves_pack_into_a_square_without_subsystems() {
        let mut nodes = (0..4)
            .map(|index| node(&format!("leaf{index}"), Layer::L3, None))
            .collect::<Vec<_>>();
        place_cell(&mut nodes, &[0, 1, 2, 3], &cell(true), 40.0);
        assert_eq!(nodes[0].world_pos, vec2(16.0, 48.0));
        assert_eq!(nodes[3].world_pos, vec2(184.0, 90.0));
    }
}
