use std::collections::BTreeMap;

use eframe::egui::Vec2;
use serde::Serialize;

use crate::config::TransitionConfig;
use crate::graph::model::Layer;
use crate::layout::LayoutGraph;
use crate::util::lerp;

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Expand,
    Collapse,
}

impl TransitionKind {
    pub fn duration_ms(self, config: &TransitionConfig) -> f32 {
        match self {
            Self::Expand => config.expand_ms,
            Self::Collapse => config.collapse_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Moving,
    Entering,
    Exiting,
}

#[derive(Clone, Debug)]
struct SnapshotNode {
    position: Vec2,
    domain_key: String,
    layer: Layer,
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    nodes: BTreeMap<String, SnapshotNode>,
}

impl Snapshot {
    pub fn capture(graph: &LayoutGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    SnapshotNode {
                        position: node.world_pos,
                        domain_key: node.domain_key.clone(),
                        layer: node.layer,
                    },
                )
            })
            .collect();
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.nodes.get(id).map(|node| node.position)
    }

    fn anchors(&self) -> BTreeMap<&str, Vec2> {
        self.nodes
            .values()
            .filter(|node| node.layer == Layer::L1)
            .map(|node| (node.domain_key.as_str(), node.position))
            .collect()
    }
}

#[derive(Clone, Debug)]
struct Track {
    id: String,
    motion: Motion,
    from: Vec2,
    to: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeFrame {
    pub id: String,
    pub motion: Motion,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug)]
pub struct Transition {
    kind: TransitionKind,
    tracks: Vec<Track>,
    elapsed_ms: f32,
    duration_ms: f32,
}

impl Transition {
    /// Pairs every node of `before` and `after` by id.
    ///
    /// Entering nodes start at their domain's L1 anchor; exiting nodes end there. The anchor is
    /// taken from the new layout first, then the old one, then the node's own position.
    pub fn between(
        before: &Snapshot,
        after: &LayoutGraph,
        kind: TransitionKind,
        config: &TransitionConfig,
    ) -> Self {
        let old_anchors = before.anchors();
        let new_anchors = after
            .nodes
            .iter()
            .filter(|node| node.layer == Layer::L1)
            .map(|node| (node.domain_key.as_str(), node.world_pos))
            .collect::<BTreeMap<_, _>>();
        let anchor_for = |domain: &str, fallback: Vec2| {
            new_anchors
                .get(domain)
                .or_else(|| old_anchors.get(domain))
                .copied()
                .unwrap_or(fallback)
        };

        let mut tracks = after
            .nodes
            .iter()
            .map(|node| match before.position(&node.id) {
                Some(from) => Track {
                    id: node.id.clone(),
                    motion: Motion::Moving,
                    from,
                    to: node.world_pos,
                },
                None => Track {
                    id: node.id.clone(),
                    motion: Motion::Entering,
                    from: anchor_for(node.domain_key.as_str(), node.world_pos),
                    to: node.world_pos,
                },
            })
            .collect::<Vec<_>>();

        for (id, node) in &before.nodes {
            if after.index_of(id).is_none() {
                tracks.push(Track {
                    id: id.clone(),
                    motion: Motion::Exiting,
                    from: node.position,
                    to: anchor_for(node.domain_key.as_str(), node.position),
                });
            }
        }

        Self {
            kind,
            tracks,
            elapsed_ms: 0.0,
            duration_ms: kind.duration_ms(config).max(0.0),
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.elapsed_ms += dt_ms.max(0.0);
        self.is_finished()
    }

    // Node states at the current instant. Exiting nodes disappear once finished.
    pub fn frame(&self) -> Vec<NodeFrame> {
        let eased = ease_in_out_cubic(self.progress());
        let finished = self.is_finished();
        self.tracks
            .iter()
            .filter(|track| !(finished && track.motion == Motion::Exiting))
            .map(|track| {
                let (scale, opacity) = match track.motion {
                    Motion::Moving => (1.0, 1.0),
                    Motion::Entering => (eased, eased),
                    Motion::Exiting => (1.0 - eased, 1.0 - eased),
                };
                NodeFrame {
                    id: track.id.clone(),
                    motion: track.motion,
                    x: lerp(track.from.x, track.to.x, eased),
                    y: lerp(track.from.y, track.to.y, eased),
                    scale,
                    opacity,
                }
            })
            .collect()
    }

    pub fn entering(&self) -> usize {
        self.count(Motion::Entering)
    }

    pub fn exiting(&self) -> usize {
        self.count(Motion::Exiting)
    }

    fn count(&self, motion: Motion) -> usize {
        self.tracks
            .iter()
            .filter(|track| track.motion == motion)
            .count()
    }
}
