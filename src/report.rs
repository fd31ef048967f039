//! Serializable views of a session, written by the command-line tool.

use serde::Serialize;

use crate::classify::Spotlight;
use crate::graph::model::{Layer, NodeKind, RelationType, ScoreSource};
use crate::graph::rank::{GraphSummary, summarize, top_bottlenecks};
use crate::layout::diagnostics::LayoutDiagnostics;
use crate::layout::{CellSlot, CollisionReport, DensityAdjustment, NodeState};
use crate::session::GraphSession;

#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub id: String,
    pub label: String,
    pub layer: Layer,
    pub domain: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub state: NodeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotlight: Option<Spotlight>,
    pub tightness: u8,
    pub tier: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeReport {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: RelationType,
    pub cross_domain: bool,
}

#[derive(Debug, Serialize)]
pub struct CellReport {
    pub key: String,
    pub label: String,
    pub tint: String,
    pub expanded: bool,
    #[serde(flatten)]
    pub slot: CellSlot,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub hotspots: Vec<String>,
    pub l2_count: usize,
    pub l3_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CameraReport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub fit_zoom: f32,
    pub occupancy_pct: f32,
    pub ratio: f32,
    pub adjustment: DensityAdjustment,
}

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub viewport: [f32; 2],
    pub expanded: Vec<String>,
    pub camera: CameraReport,
    pub collision: CollisionReport,
    pub cells: Vec<CellReport>,
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
    pub diagnostics: LayoutDiagnostics,
}

impl LayoutReport {
    pub fn from_session(session: &GraphSession) -> Self {
        let layout = session.layout();
        let outcome = session.outcome();
        let density = &outcome.density;

        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeReport {
                id: node.id.clone(),
                label: node.label.clone(),
                layer: node.layer,
                domain: node.domain_key.clone(),
                kind: node.kind.clone(),
                state: node.state,
                spotlight: node.spotlight,
                tightness: node.tightness,
                tier: node.tier,
                x: node.world_pos.x,
                y: node.world_pos.y,
                width: node.size.x,
                height: node.size.y,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeReport {
                id: edge.id.clone(),
                source: layout.nodes[edge.source].id.clone(),
                target: layout.nodes[edge.target].id.clone(),
                relation: edge.relation,
                cross_domain: edge.cross_domain,
            })
            .collect();

        let disclosure = session.disclosure();
        let cells = outcome
            .cells
            .values()
            .map(|cell| {
                let counts = disclosure.child_counts(&cell.key);
                CellReport {
                    key: cell.key.clone(),
                    label: cell.label.clone(),
                    tint: cell.tint.clone(),
                    expanded: cell.expanded,
                    slot: cell.slot,
                    x: cell.rect.min.x,
                    y: cell.rect.min.y,
                    width: cell.rect.width(),
                    height: cell.rect.height(),
                    hotspots: disclosure.hotspots(&cell.key).to_vec(),
                    l2_count: counts.l2,
                    l3_count: counts.l3,
                }
            })
            .collect();

        Self {
            viewport: [session.viewport().x, session.viewport().y],
            expanded: session.expansion().expanded().map(str::to_owned).collect(),
            camera: CameraReport {
                zoom: session.camera().zoom,
                pan_x: session.camera().pan.x,
                pan_y: session.camera().pan.y,
                fit_zoom: density.fit_zoom,
                occupancy_pct: density.occupancy_pct,
                ratio: density.ratio,
                adjustment: density.adjustment,
            },
            collision: outcome.collision,
            cells,
            nodes,
            edges,
            diagnostics: session.diagnostics(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BottleneckRow {
    pub rank: usize,
    pub id: String,
    pub label: String,
    pub layer: Layer,
    pub domain: String,
    pub tightness: u8,
    pub tier: u8,
    pub source: ScoreSource,
}

#[derive(Debug, Serialize)]
pub struct TopReport {
    pub summary: GraphSummary,
    pub bottlenecks: Vec<BottleneckRow>,
}

impl TopReport {
    pub fn from_session(session: &GraphSession, limit: usize) -> Self {
        let graph = session.graph();
        let bottlenecks = top_bottlenecks(graph, limit)
            .into_iter()
            .enumerate()
            .map(|(index, node)| BottleneckRow {
                rank: index + 1,
                id: node.id.clone(),
                label: node.label.clone(),
                layer: node.layer,
                domain: node.domain_key.clone(),
                tightness: node.tightness.index,
                tier: node.tightness.tier,
                source: node.tightness.source,
            })
            .collect();

        Self {
            summary: summarize(graph),
            bottlenecks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpotlightMember {
    pub id: String,
    pub label: String,
    pub domain: String,
    pub tightness: u8,
}

#[derive(Debug, Serialize)]
pub struct SpotlightReport {
    pub theme: Spotlight,
    pub label: &'static str,
    pub accent: String,
    pub path_nodes: usize,
    pub path_edges: usize,
    pub members: Vec<SpotlightMember>,
    pub edges: Vec<String>,
}

impl SpotlightReport {
    // Tagged members are listed tightest first; anchors only count toward `path_nodes`.
    pub fn from_session(session: &GraphSession, theme: Spotlight) -> Self {
        let layout = session.layout();
        let lit = session.spotlight(theme);

        let mut members = lit
            .nodes
            .iter()
            .map(|&index| &layout.nodes[index])
            .filter(|node| node.spotlight == Some(theme))
            .map(|node| SpotlightMember {
                id: node.id.clone(),
                label: node.label.clone(),
                domain: node.domain_key.clone(),
                tightness: node.tightness,
            })
            .collect::<Vec<_>>();
        members.sort_by(|a, b| b.tightness.cmp(&a.tightness).then_with(|| a.id.cmp(&b.id)));

        let accent = theme.accent();
        Self {
            theme,
            label: theme.label(),
            accent: format!("#{:02x}{:02x}{:02x}", accent.r(), accent.g(), accent.b()),
            path_nodes: lit.nodes.len(),
            path_edges: lit.edges.len(),
            members,
            edges: lit
                .edges
                .iter()
                .map(|&index| layout.edges[index].id.clone())
                .collect(),
        }
    }
}
