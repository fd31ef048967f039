use std::collections::HashMap;

use eframe::egui::{Rect, Vec2, vec2};
use serde::Serialize;
use tracing::trace;

use super::LayoutNode;
use crate::config::CollisionConfig;

#[derive(Default)]
pub(super) struct CollisionScratch {
    buckets: HashMap<(i32, i32), Vec<usize>>,
    half_sizes: Vec<Vec2>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollisionReport {
    pub iterations: usize,
    pub converged: bool,
    pub residual_overlaps: usize,
}

fn bucket_of(position: Vec2, bucket_size: f32) -> (i32, i32) {
    (
        (position.x / bucket_size).floor() as i32,
        (position.y / bucket_size).floor() as i32,
    )
}

// Unit vector from `a` toward `b`; coincident pairs get a stable pseudo-random heading.
fn separation_direction(delta: Vec2, distance: f32, from: usize, to: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// Keeps a node inside `bounds`, inset by its half-size; nodes wider than the cell are centered.
pub(super) fn clamp_into(position: Vec2, half: Vec2, bounds: Rect) -> Vec2 {
    let axis = |value: f32, lo: f32, hi: f32| {
        if lo > hi {
            (lo + hi) / 2.0
        } else {
            value.clamp(lo, hi)
        }
    };
    vec2(
        axis(position.x, bounds.min.x + half.x, bounds.max.x - half.x),
        axis(position.y, bounds.min.y + half.y, bounds.max.y - half.y),
    )
}

fn clamp_all(nodes: &mut [LayoutNode], half_sizes: &[Vec2], bounds: &[Rect]) {
    for ((node, half), cell) in nodes.iter_mut().zip(half_sizes).zip(bounds) {
        node.world_pos = clamp_into(node.world_pos, *half, *cell);
    }
}

fn rebuild_buckets(scratch: &mut CollisionScratch, nodes: &[LayoutNode], bucket_size: f32) {
    for bucket in scratch.buckets.values_mut() {
        bucket.clear();
    }
    for (index, node) in nodes.iter().enumerate() {
        scratch
            .buckets
            .entry(bucket_of(node.world_pos, bucket_size))
            .or_default()
            .push(index);
    }
}

/// Soft overlap relaxation over a uniform spatial hash, clamping into `bounds` after every pass.
///
/// `bounds[i]` is the cell rect of `nodes[i]`. Pairs are pushed apart by `damping` of their
/// overlap per pass; partial overlap after the iteration cap is accepted.
pub(super) fn resolve_collisions(
    nodes: &mut [LayoutNode],
    bounds: &[Rect],
    config: &CollisionConfig,
    scratch: &mut CollisionScratch,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    if nodes.is_empty() {
        report.converged = true;
        return report;
    }

    let fallback = config.fallback_node_size;
    scratch.half_sizes.clear();
    scratch.half_sizes.extend(nodes.iter().map(|node| {
        vec2(
            if node.size.x > 0.0 { node.size.x } else { fallback },
            if node.size.y > 0.0 { node.size.y } else { fallback },
        ) / 2.0
    }));
    let max_width = scratch
        .half_sizes
        .iter()
        .map(|half| half.x * 2.0)
        .fold(0.0_f32, f32::max);
    let bucket_size = (max_width + config.padding).max(1.0);

    for iteration in 0..config.iterations {
        rebuild_buckets(scratch, nodes, bucket_size);
        let mut moved = false;

        for from in 0..nodes.len() {
            let (gx, gy) = bucket_of(nodes[from].world_pos, bucket_size);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(bucket) = scratch.buckets.get(&(gx + dx, gy + dy)) else {
                        continue;
                    };
                    for &to in bucket {
                        if to <= from {
                            continue;
                        }

                        let delta = nodes[to].world_pos - nodes[from].world_pos;
                        let distance = delta.length();
                        let min_distance = scratch.half_sizes[from].x
                            + scratch.half_sizes[to].x
                            + config.padding;
                        if distance >= min_distance {
                            continue;
                        }

                        let direction = separation_direction(delta, distance, from, to);
                        let push = (min_distance - distance) * config.damping;
                        nodes[from].world_pos -= direction * push;
                        nodes[to].world_pos += direction * push;
                        if push > config.movement_epsilon {
                            moved = true;
                        }
                    }
                }
            }
        }

        clamp_all(nodes, &scratch.half_sizes, bounds);

        report.iterations = iteration + 1;
        trace!(iteration, moved, "collision pass");
        if !moved {
            report.converged = true;
            break;
        }
    }

    if config.iterations == 0 {
        clamp_all(nodes, &scratch.half_sizes, bounds);
    }

    report.residual_overlaps = count_overlaps(nodes, scratch, bucket_size, config.padding);
    report
}

fn count_overlaps(
    nodes: &[LayoutNode],
    scratch: &mut CollisionScratch,
    bucket_size: f32,
    padding: f32,
) -> usize {
    rebuild_buckets(scratch, nodes, bucket_size);
    let mut overlaps = 0;
    for (from, node) in nodes.iter().enumerate() {
        let (gx, gy) = bucket_of(node.world_pos, bucket_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = scratch.buckets.get(&(gx + dx, gy + dy)) else {
                    continue;
                };
                overlaps += bucket
                    .iter()
                    .filter(|&&to| to > from)
                    .filter(|&&to| {
                        let min_distance = scratch.half_sizes[from].x
                            + scratch.half_sizes[to].x
                            + padding;
                        (nodes[to].world_pos - node.world_pos).length() < min_distance - 0.5
                    })
                    .count();
            }
        }
    }
    overlaps
}
