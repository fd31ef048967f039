use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{Rect, Vec2, pos2, vec2};
use serde::Serialize;
use tracing::debug;

use crate::classify::OTHER_DOMAIN;
use crate::config::{DomainCatalog, LayoutConfig};
use crate::disclosure::ExpansionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "region", rename_all = "snake_case")]
pub enum CellSlot {
    Grid { row: usize, column: usize },
    Overflow { index: usize },
}

impl CellSlot {
    pub fn is_overflow(self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomainCell {
    pub key: String,
    pub rect: Rect,
    pub expanded: bool,
    pub label: String,
    pub tint: String,
    pub slot: CellSlot,
}

pub type DomainCells = BTreeMap<String, DomainCell>;

/// Curated order first, then any other present domains by key. "other" never takes a grid slot.
pub fn ordered_domains<'a>(
    present: impl IntoIterator<Item = &'a str>,
    catalog: &DomainCatalog,
) -> Vec<String> {
    let present = present
        .into_iter()
        .filter(|key| *key != OTHER_DOMAIN)
        .collect::<BTreeSet<_>>();

    let mut ordered = catalog
        .order
        .iter()
        .filter(|key| present.contains(key.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    for key in present {
        if !ordered.iter().any(|known| known == key) {
            ordered.push(key.to_owned());
        }
    }
    ordered
}

pub fn cell_size(canvas: Vec2, config: &LayoutConfig) -> Vec2 {
    let grid = &config.grid;
    let columns = grid.columns.max(1) as f32;
    let rows = grid.rows.max(1) as f32;
    let usable = canvas - grid.margin() * 2.0;
    vec2(
        ((usable.x - (columns - 1.0) * grid.gap().x) / columns).max(1.0),
        ((usable.y - (rows - 1.0) * grid.gap().y) / rows).max(1.0),
    )
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellDemand {
    pub count: usize,
    pub largest: Vec2,
}

impl CellDemand {
    pub fn add(&mut self, size: Vec2) {
        self.count += 1;
        self.largest = self.largest.max(size);
    }
}

pub fn wrap_pitch(pitch: f32, largest: Vec2) -> Vec2 {
    Vec2::splat(pitch.max(1.0)).max(largest)
}

pub fn overflow_columns(cell_width: f32, step: f32) -> usize {
    ((cell_width / step.max(1.0)).floor() as usize).max(1)
}

/// Lays out one cell per domain with visible nodes.
///
/// The first `columns * rows` ordered domains fill the grid row by row; partial rows after
/// the first are centered. Remaining domains, then "other", wrap into overflow cells below.
pub fn compute_cells(
    demand: &BTreeMap<String, CellDemand>,
    expansion: &ExpansionState,
    canvas: Vec2,
    config: &LayoutConfig,
) -> DomainCells {
    let grid = &config.grid;
    let columns = grid.columns.max(1);
    let margin = grid.margin();
    let gap = grid.gap();
    let size = cell_size(canvas, config);
    let usable_width = canvas.x - margin.x * 2.0;

    let present = demand
        .iter()
        .filter(|(_, demand)| demand.count > 0)
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>();
    let ordered = ordered_domains(present.iter().copied(), &config.domains);
    let capacity = grid.capacity().min(ordered.len());

    let mut cells = DomainCells::new();
    let mut push = |key: &str, rect: Rect, slot: CellSlot| {
        cells.insert(
            key.to_owned(),
            DomainCell {
                key: key.to_owned(),
                rect,
                expanded: expansion.is_expanded(key),
                label: config.domains.label_for(key),
                tint: config.domains.tint_for(key),
                slot,
            },
        );
    };

    for (index, key) in ordered[..capacity].iter().enumerate() {
        let row = index / columns;
        let column = index % columns;
        let in_row = (capacity - row * columns).min(columns);
        let row_left = if row == 0 || in_row == columns {
            margin.x
        } else {
            let row_width = in_row as f32 * size.x + (in_row - 1) as f32 * gap.x;
            margin.x + (usable_width - row_width) / 2.0
        };
        let min = pos2(
            row_left + column as f32 * (size.x + gap.x),
            margin.y + row as f32 * (size.y + gap.y),
        );
        push(key, Rect::from_min_size(min, size), CellSlot::Grid { row, column });
    }

    let mut overflow = ordered[capacity..].to_vec();
    if !overflow.is_empty() {
        debug!(domains = ?overflow, "domains beyond grid capacity moved to overflow");
    }
    if present.contains(&OTHER_DOMAIN) {
        overflow.push(OTHER_DOMAIN.to_owned());
    }

    let pitch = grid.overflow_pitch.max(1.0);
    let mut top = margin.y + grid.rows.max(1) as f32 * (size.y + gap.y);
    for (band, chunk) in overflow.chunks(columns).enumerate() {
        let heights = chunk
            .iter()
            .map(|key| {
                let need = demand.get(key).copied().unwrap_or_default();
                let step = wrap_pitch(pitch, need.largest);
                let rows = need.count.div_ceil(overflow_columns(size.x, step.x)).max(1);
                rows as f32 * step.y + pitch
            })
            .collect::<Vec<_>>();
        let band_height = heights.iter().copied().fold(pitch, f32::max);

        for (column, (key, height)) in chunk.iter().zip(heights).enumerate() {
            let min = pos2(margin.x + column as f32 * (size.x + gap.x), top);
            push(
                key,
                Rect::from_min_size(min, vec2(size.x, height)),
                CellSlot::Overflow {
                    index: band * columns + column,
                },
            );
        }
        top += band_height + gap.y;
    }

    cells
}

pub fn overflow_region(cells: &DomainCells) -> Option<Rect> {
    cells
        .values()
        .filter(|cell| cell.slot.is_overflow())
        .map(|cell| cell.rect)
        .reduce(|a, b| a.union(b))
}
