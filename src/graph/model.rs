use std::collections::HashMap;

use serde::Serialize;

use crate::classify::{Category, Spotlight};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Layer {
    L1,
    L2,
    L3,
    L4,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::L1, Layer::L2, Layer::L3, Layer::L4];

    // Sort rank: anchors first, satellites last.
    pub fn rank(self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
            Self::L4 => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
        }
    }

    pub fn is_core(self) -> bool {
        !matches!(self, Self::L4)
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "L1" => Some(Self::L1),
            "L2" => Some(Self::L2),
            "L3" => Some(Self::L3),
            "L4" => Some(Self::L4),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    DomainComponent,
    Company,
    EvidenceSource { url: Option<String> },
    EvidenceGap,
    SourceReference { token: String },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DomainComponent => "domain_component",
            Self::Company => "company",
            Self::EvidenceSource { .. } => "evidence_source",
            Self::EvidenceGap => "evidence_gap",
            Self::SourceReference { .. } => "source_reference",
        }
    }

    pub fn is_company(&self) -> bool {
        matches!(self, Self::Company)
    }

    // Evidence-like satellites share the small evidence geometry.
    pub fn is_evidence(&self) -> bool {
        matches!(
            self,
            Self::EvidenceSource { .. } | Self::EvidenceGap | Self::SourceReference { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Confidence {
    /// Lenient parse: "HIGH", "high confidence" and "High (vendor)" all read as high.
    pub fn from_text(text: &str) -> Self {
        let text = text.to_ascii_lowercase();
        if text.contains("high") {
            Self::High
        } else if text.contains("med") {
            Self::Medium
        } else if text.contains("low") {
            Self::Low
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RawMetrics {
    pub lead_time_weeks: Option<f64>,
    pub capacity: Option<f64>,
    pub trade_cost_uplift_pct: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Override,
    Derived,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tightness {
    pub index: u8,
    pub tier: u8,
    pub source: ScoreSource,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
    pub size_class: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub layer: Layer,
    pub domain_key: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub metrics: RawMetrics,
    pub confidence: Confidence,
    pub category: Category,
    pub spotlight: Option<Spotlight>,
    pub tightness: Tightness,
    pub geometry: Geometry,
}

impl Node {
    // Ranked as a bottleneck: hierarchy components only.
    pub fn is_core_component(&self) -> bool {
        self.layer.is_core() && matches!(self.kind, NodeKind::DomainComponent)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    DecomposesTo,
    DependsOn,
    EvidencedBy,
    ConstrainedByGap,
    SuppliedBy,
}

impl RelationType {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "decomposes_to" => Self::DecomposesTo,
            "evidenced_by" => Self::EvidencedBy,
            "constrained_by_gap" => Self::ConstrainedByGap,
            "supplied_by" | "depends_on_company" => Self::SuppliedBy,
            _ => Self::DependsOn,
        }
    }

    pub fn is_hierarchy(self) -> bool {
        matches!(self, Self::DecomposesTo)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: RelationType,
    pub confidence: Confidence,
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub index_by_id: HashMap<String, usize>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn domain_keys(&self) -> Vec<String> {
        let mut keys = self
            .nodes
            .iter()
            .map(|node| node.domain_key.clone())
            .collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        keys
    }
}
