use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use eframe::egui::Color32;
use regex::Regex;
use serde::Serialize;

use crate::config::ClassifierConfig;
use crate::graph::load::{RawNode, RawWhitelistEntry};
use crate::graph::model::{Layer, NodeKind};

pub const OTHER_DOMAIN: &str = "other";

static SOURCE_REF_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^n_l2_[^_]+_(.+)$").expect("valid source id pattern"));
static CITATION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[-_])(osti|uscode|usgs|census|dfars|faa|doe|hs\d{4,})($|[-_])")
        .expect("valid citation pattern")
});
static TOKEN_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("valid token pattern"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid dash pattern"));

static CATEGORY_RULES: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    [
        (
            Category::Sensors,
            r"(sensor|imu|gnss|altimeter|vision|lidar|radar|navigation)",
        ),
        (
            Category::CameraPayload,
            r"(camera|payload|gimbal|eoir|eo/ir|video|optic)",
        ),
        (
            Category::AssemblyIntegrationManufacturing,
            r"(assembly|integration|manufacturing|takt|line|hil|factory|throughput)",
        ),
        (
            Category::SecureComms,
            r"(securecomms|secure_comms|crypto|antenna|rf)",
        ),
        (
            Category::ControlElectronics,
            r"(mcu|bms|control|flight_control)",
        ),
        (Category::EnergyBattery, r"(battery|energy|cell|thermal)"),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, Regex::new(pattern).expect("valid category pattern")))
    .collect()
});

/// Thematic bucket used for spotlight grouping. First matching rule wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sensors,
    CameraPayload,
    AssemblyIntegrationManufacturing,
    SecureComms,
    ControlElectronics,
    EnergyBattery,
    Other,
}

impl Category {
    pub fn spotlight(self) -> Option<Spotlight> {
        match self {
            Self::Sensors => Some(Spotlight::Sensors),
            Self::CameraPayload => Some(Spotlight::CameraPayload),
            Self::AssemblyIntegrationManufacturing => Some(Spotlight::AssemblyIntegration),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Spotlight {
    Sensors,
    CameraPayload,
    AssemblyIntegration,
}

impl Spotlight {
    pub const ALL: [Self; 3] = [Self::Sensors, Self::CameraPayload, Self::AssemblyIntegration];

    pub fn key(self) -> &'static str {
        match self {
            Self::Sensors => "sensors",
            Self::CameraPayload => "camera_payload",
            Self::AssemblyIntegration => "assembly_integration",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sensors => "Sensors",
            Self::CameraPayload => "Camera / Payload",
            Self::AssemblyIntegration => "Assembly / Integration / Manufacturing",
        }
    }

    pub fn accent(self) -> Color32 {
        match self {
            Self::Sensors => Color32::from_rgb(0x3b, 0x6f, 0xb5),
            Self::CameraPayload => Color32::from_rgb(0x6e, 0x5b, 0xa8),
            Self::AssemblyIntegration => Color32::from_rgb(0xa6, 0x7c, 0x20),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub layer: Layer,
    pub domain_key: String,
    pub kind: NodeKind,
    pub category: Category,
}

pub struct Classifier<'a> {
    config: &'a ClassifierConfig,
    representative: HashSet<&'a str>,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a ClassifierConfig) -> Self {
        Self {
            config,
            representative: config.representative_l3.iter().map(String::as_str).collect(),
        }
    }

    pub fn classify(&self, raw: &RawNode) -> Classification {
        let node_type = raw.node_type.as_deref().unwrap_or_default();
        let label = raw.label.as_deref().unwrap_or_default();
        let source_token = source_reference_token(&raw.id, node_type, label);

        let layer = if source_token.is_some() {
            Layer::L4
        } else {
            self.layer_for(node_type, &raw.id)
        };
        let domain_key = self.domain_key(raw.domain.as_deref(), &raw.id);
        let kind = match source_token {
            Some(token) => NodeKind::SourceReference { token },
            None => kind_from_type(node_type, raw.url.as_deref()),
        };
        let category = infer_category(&raw.id, &domain_key, label, node_type);

        Classification {
            layer,
            domain_key,
            kind,
            category,
        }
    }

    // Case-insensitive substring match on the declared type; unknown types are satellites.
    pub fn layer_for(&self, node_type: &str, id: &str) -> Layer {
        let node_type = node_type.to_ascii_lowercase();
        if node_type.contains("l1") {
            Layer::L1
        } else if node_type.contains("l2") {
            Layer::L2
        } else if node_type.contains("l3") || self.representative.contains(id) {
            Layer::L3
        } else {
            Layer::L4
        }
    }

    pub fn domain_key(&self, explicit: Option<&str>, id: &str) -> String {
        if let Some(explicit) = explicit.map(str::trim)
            && !explicit.is_empty()
        {
            return explicit.to_owned();
        }

        match id.strip_prefix(self.config.l1_prefix.as_str()) {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => OTHER_DOMAIN.to_owned(),
        }
    }
}

fn kind_from_type(node_type: &str, url: Option<&str>) -> NodeKind {
    match node_type.trim().to_ascii_lowercase().as_str() {
        "company" => NodeKind::Company,
        "source" => NodeKind::EvidenceSource {
            url: url.map(str::to_owned).filter(|url| !url.is_empty()),
        },
        "gap" => NodeKind::EvidenceGap,
        _ => NodeKind::DomainComponent,
    }
}

fn strip_quotes(text: &str) -> String {
    text.chars()
        .filter(|ch| *ch != '`' && *ch != '\'')
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Slug derived from the id suffix (`n_l2_<domain>_<token>`) or, failing that, the label.
pub fn source_token(id: &str, label: &str) -> String {
    let raw = SOURCE_REF_ID
        .captures(id)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().to_owned())
        .filter(|token| !token.is_empty())
        .unwrap_or_else(|| strip_quotes(label));

    let lowered = raw
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let cleaned = TOKEN_JUNK.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_owned()
}

pub fn source_reference_token(id: &str, node_type: &str, label: &str) -> Option<String> {
    if !node_type.to_ascii_lowercase().contains("l2") {
        return None;
    }

    let token = source_token(id, label);
    let is_reference = strip_quotes(label).to_lowercase() == "source id"
        || id.to_lowercase().ends_with("_source_id")
        || token.starts_with("l1-")
        || token.starts_with("l1_")
        || CITATION_TOKEN.is_match(&token);

    is_reference.then_some(token)
}

pub fn infer_category(id: &str, domain_key: &str, label: &str, node_type: &str) -> Category {
    let haystack = format!("{id} {domain_key} {label} {node_type}").to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, pattern)| pattern.is_match(&haystack))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[derive(Clone, Debug, Default)]
pub struct ComponentWhitelist {
    entries: HashMap<String, (Option<Layer>, bool)>,
}

impl ComponentWhitelist {
    pub fn from_entries(rows: &[RawWhitelistEntry]) -> Self {
        let entries = rows
            .iter()
            .map(|row| {
                (
                    row.node_id.clone(),
                    (Layer::parse(&row.layer), row.is_component()),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Listed, declared at the computed layer, and flagged as a genuine component.
    pub fn admits(&self, id: &str, layer: Layer) -> bool {
        matches!(
            self.entries.get(id),
            Some((Some(listed), true)) if *listed == layer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, node_type: &str, label: &str) -> RawNode {
        RawNode {
            id: id.to_owned(),
            label: Some(label.to_owned()),
            node_type: Some(node_type.to_owned()),
            ..RawNode::default()
        }
    }

    #[test]
    fn layer_follows_declared_type() {
        let config = ClassifierConfig::default();
        let classifier = Classifier::new(&config);
        assert_eq!(classifier.layer_for("L1_domain", "x"), Layer::L1);
        assert_eq!(classifier.layer_for("l2_subsystem", "x"), Layer::L2);
        assert_eq!(classifier.layer_for("L3", "x"), Layer::L3);
        assert_eq!(classifier.layer_for("source", "x"), Layer::L4);
        assert_eq!(classifier.layer_for("mystery", "x"), Layer::L4);
        assert_eq!(
            classifier.layer_for("component", "n_l3_sensors_nav_grade_imu"),
            Layer::L3
        );
    }

    #[test]
    fn domain_key_prefers_explicit_then_prefix() {
        let config = ClassifierConfig::default();
        let classifier = Classifier::new(&config);
        assert_eq!(
            classifier.domain_key(Some("propulsion"), "n_l2_x"),
            "propulsion"
        );
        assert_eq!(classifier.domain_key(Some("  "), "n_l1_airframe"), "airframe");
        assert_eq!(classifier.domain_key(None, "n_l3_motor"), OTHER_DOMAIN);
        assert_eq!(classifier.domain_key(None, "n_l1_"), OTHER_DOMAIN);
    }

    #[test]
    fn source_reference_nodes_become_satellites() {
        let config = ClassifierConfig::default();
        let classifier = Classifier::new(&config);

        let citation = classifier.classify(&raw(
            "n_l2_energy_storage_l1_energy_usgs_mcs2026",
            "L2",
            "L1-energy usgs",
        ));
        assert_eq!(citation.layer, Layer::L4);
        assert!(matches!(citation.kind, NodeKind::SourceReference { .. }));

        let mapping = classifier.classify(&raw("n_l2_propulsion_source_id", "L2", "Source ID"));
        assert_eq!(mapping.layer, Layer::L4);

        let subsystem = classifier.classify(&raw("n_l2_propulsion_motor", "L2", "Motor"));
        assert_eq!(subsystem.layer, Layer::L2);
        assert_eq!(subsystem.kind, NodeKind::DomainComponent);
    }

    #[test]
    fn source_token_is_slugged() {
        assert_eq!(source_token("x", "`Census HS850760` 2024"), "census-hs850760-2024");
        assert_eq!(
            source_token("n_l2_propulsion_l1_prop_dfars_2257018", ""),
            "l1_prop_dfars_2257018"
        );
    }

    #[test]
    fn categories_match_in_priority_order() {
        assert_eq!(
            infer_category("n_l3_gimbal_imu", "", "", ""),
            Category::Sensors
        );
        assert_eq!(
            infer_category("n_l3_eoir", "payload_system", "", ""),
            Category::CameraPayload
        );
        assert_eq!(infer_category("n_l3_x", "", "BMS board", ""), Category::ControlElectronics);
        assert_eq!(infer_category("n_l3_x", "", "widget", ""), Category::Other);
        assert_eq!(Category::Sensors.spotlight(), Some(Spotlight::Sensors));
        assert_eq!(Category::EnergyBattery.spotlight(), None);
        assert_eq!(Spotlight::from_key("Camera_Payload"), Some(Spotlight::CameraPayload));
        assert_eq!(Spotlight::from_key("energy"), None);
    }

    #[test]
    fn whitelist_is_closed_world() {
        let whitelist = ComponentWhitelist::from_entries(&[
            RawWhitelistEntry {
                node_id: "a".to_owned(),
                layer: "L2".to_owned(),
                is_component: serde_json::json!("yes"),
            },
            RawWhitelistEntry {
                node_id: "b".to_owned(),
                layer: "L3".to_owned(),
                is_component: serde_json::json!(false),
            },
        ]);
        assert!(whitelist.admits("a", Layer::L2));
        assert!(!whitelist.admits("a", Layer::L3));
        assert!(!whitelist.admits("b", Layer::L3));
        assert!(!whitelist.admits("c", Layer::L1));
    }
}
