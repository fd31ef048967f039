use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use crate::util::prettify_key;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub layout: LayoutConfig,
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Id prefix of domain anchors; `n_l1_propulsion` belongs to `propulsion`.
    pub l1_prefix: String,
    pub representative_l3: Vec<String>,
    pub components_only: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            l1_prefix: "n_l1_".to_owned(),
            representative_l3: [
                "n_l3_sensors_nav_grade_imu",
                "n_l3_sensors_altimeter_stack",
                "n_l3_camera_payload_eoir_gimbal",
                "n_l3_camera_payload_encoder_link",
                "n_l3_assembly_integration_final_assembly_cell",
                "n_l3_assembly_integration_hil_test_rig",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            components_only: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub capacity_weight: f64,
    pub lead_time_weight: f64,
    pub trade_cost_weight: f64,
    pub confidence_weight: f64,
    pub missing_capacity_risk: f64,
    pub missing_lead_time_pressure: f64,
    pub missing_trade_cost_pressure: f64,
    pub high_confidence_penalty: f64,
    pub medium_confidence_penalty: f64,
    pub low_confidence_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            capacity_weight: 0.35,
            lead_time_weight: 0.25,
            trade_cost_weight: 0.25,
            confidence_weight: 0.15,
            missing_capacity_risk: 0.7,
            missing_lead_time_pressure: 0.6,
            missing_trade_cost_pressure: 0.6,
            high_confidence_penalty: 0.15,
            medium_confidence_penalty: 0.45,
            low_confidence_penalty: 0.75,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub grid: GridConfig,
    pub disclosure: DisclosureConfig,
    pub collision: CollisionConfig,
    pub density: DensityConfig,
    pub domains: DomainCatalog,
    pub transition: TransitionConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
    pub margin: [f32; 2],
    pub gap: [f32; 2],
    pub min_canvas: [f32; 2],
    pub overflow_pitch: f32,
}

impl GridConfig {
    pub fn capacity(&self) -> usize {
        self.columns.max(1) * self.rows.max(1)
    }

    pub fn margin(&self) -> Vec2 {
        vec2(self.margin[0], self.margin[1])
    }

    pub fn gap(&self) -> Vec2 {
        vec2(self.gap[0], self.gap[1])
    }

    // Canvas the grid is carved from: the viewport, never smaller than `min_canvas`.
    pub fn canvas_for(&self, viewport: Vec2) -> Vec2 {
        vec2(
            viewport.x.max(self.min_canvas[0]),
            viewport.y.max(self.min_canvas[1]),
        )
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 2,
            margin: [40.0, 36.0],
            gap: [32.0, 40.0],
            min_canvas: [1200.0, 800.0],
            overflow_pitch: 40.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisclosureConfig {
    pub hotspots_per_domain: usize,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            hotspots_per_domain: crate::disclosure::DEFAULT_HOTSPOTS_PER_DOMAIN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub iterations: usize,
    pub padding: f32,
    pub damping: f32,
    pub movement_epsilon: f32,
    pub fallback_node_size: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            iterations: 15,
            padding: 16.0,
            damping: 0.28,
            movement_epsilon: 0.01,
            fallback_node_size: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub fit_padding: f32,
    pub mobile_padding: f32,
    pub mobile_width: f32,
    pub low_occupancy_pct: f32,
    pub high_occupancy_pct: f32,
    pub zoom_in_target_pct: f32,
    pub zoom_out_target_pct: f32,
    pub max_zoom_in: f32,
    pub max_zoom_out: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            fit_padding: 28.0,
            mobile_padding: 6.0,
            mobile_width: 600.0,
            low_occupancy_pct: 58.0,
            high_occupancy_pct: 84.0,
            zoom_in_target_pct: 68.0,
            zoom_out_target_pct: 78.0,
            max_zoom_in: 1.28,
            max_zoom_out: 0.82,
            min_zoom: 0.05,
            max_zoom: 6.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub expand_ms: f32,
    pub collapse_ms: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            expand_ms: 420.0,
            collapse_ms: 380.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DomainCatalog {
    pub order: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub tints: BTreeMap<String, String>,
    pub fallback_tint: String,
}

impl DomainCatalog {
    pub fn label_for(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| prettify_key(key))
    }

    pub fn tint_for(&self, key: &str) -> String {
        self.tints
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.fallback_tint.clone())
    }
}

impl Default for DomainCatalog {
    fn default() -> Self {
        const DOMAINS: [(&str, &str, &str); 8] = [
            ("propulsion", "Propulsion", "#ffedd5"),
            ("energy_storage", "Energy Storage", "#fef3c7"),
            ("flight_control_guidance", "Flight Control", "#d1fae5"),
            ("secure_communications", "Secure Comms", "#ede9fe"),
            ("navigation_system", "PNT", "#dbeafe"),
            ("manufacturing_system", "Manufacturing", "#e0e7ff"),
            ("airframe", "Airframe", "#dcfce7"),
            ("payload_system", "Payload", "#f3e8ff"),
        ];

        let mut labels = BTreeMap::new();
        let mut tints = BTreeMap::new();
        labels.insert("other".to_owned(), "Other".to_owned());
        for (key, label, tint) in DOMAINS {
            labels.insert(key.to_owned(), label.to_owned());
            tints.insert(key.to_owned(), tint.to_owned());
        }

        Self {
            order: DOMAINS.iter().map(|(key, _, _)| (*key).to_owned()).collect(),
            labels,
            tints,
            fallback_tint: "#f1f5f9".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "layout": { "collision": { "iterations": 25 } } }"#)
                .expect("config parses");
        assert_eq!(config.layout.collision.iterations, 25);
        assert_eq!(config.layout.collision.padding, 16.0);
        assert_eq!(config.layout.grid.capacity(), 8);
        assert_eq!(config.scoring.capacity_weight, 0.35);
        assert_eq!(config.classifier.l1_prefix, "n_l1_");
    }

    #[test]
    fn canvas_never_shrinks_below_minimum() {
        let grid = GridConfig::default();
        assert_eq!(grid.canvas_for(vec2(400.0, 300.0)), vec2(1200.0, 800.0));
        assert_eq!(grid.canvas_for(vec2(1600.0, 900.0)), vec2(1600.0, 900.0));
    }

    #[test]
    fn catalog_falls_back_to_prettified_key() {
        let catalog = DomainCatalog::default();
        assert_eq!(catalog.label_for("propulsion"), "Propulsion");
        assert_eq!(catalog.label_for("launch_support"), "launch support");
        assert_eq!(catalog.tint_for("launch_support"), "#f1f5f9");
    }
}
