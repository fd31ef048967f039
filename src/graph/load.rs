use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use crate::util::first_number;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
    #[serde(alias = "node_id")]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default, alias = "l1_component", alias = "domain_key")]
    pub domain: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, alias = "lead_time")]
    pub lead_time_weeks: Option<Value>,
    #[serde(default, alias = "effective_capacity")]
    pub capacity: Option<Value>,
    #[serde(default, alias = "landed_cost_uplift_pct")]
    pub trade_cost_uplift_pct: Option<Value>,
    #[serde(default, alias = "confidence_tier")]
    pub confidence: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEdge {
    #[serde(default, alias = "edge_id")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, alias = "relation", alias = "edge_type")]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawTightnessOverride {
    pub node_id: String,
    pub score: Value,
}

impl RawTightnessOverride {
    pub fn score(&self) -> Option<f64> {
        metric_value(&self.score)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawWhitelistEntry {
    pub node_id: String,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub is_component: Value,
}

impl RawWhitelistEntry {
    pub fn is_component(&self) -> bool {
        match &self.is_component {
            Value::Bool(flag) => *flag,
            Value::String(text) => {
                matches!(text.trim().to_ascii_lowercase().as_str(), "yes" | "true")
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDataset {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    pub tightness_overrides: Vec<RawTightnessOverride>,
    pub whitelist: Vec<RawWhitelistEntry>,
}

// Numbers pass through; strings such as "12 weeks" yield their first number.
pub fn metric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => first_number(text),
        _ => None,
    }
}

pub fn parse_dataset(raw: &str) -> Result<RawDataset> {
    let parsed: Value = serde_json::from_str(raw).context("invalid graph JSON")?;
    if !parsed.is_object() {
        return Err(anyhow!("graph JSON must be an object with `nodes` and `edges`"));
    }

    let dataset = RawDataset::deserialize(parsed).context("invalid graph document")?;
    if let Some(node) = dataset.nodes.iter().find(|node| node.id.trim().is_empty()) {
        return Err(anyhow!("node with empty id (label {:?})", node.label));
    }
    Ok(dataset)
}

pub fn load_dataset(path: &Path) -> Result<RawDataset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph {}", path.display()))?;
    parse_dataset(&raw).with_context(|| format!("failed to parse graph {}", path.display()))
}
