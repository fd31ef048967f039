use crate::config::ScoringConfig;
use crate::graph::model::{Confidence, Geometry, Layer, NodeKind, RawMetrics, ScoreSource, Tightness};
use crate::util::lerp;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricRange {
    bounds: Option<(f64, f64)>,
}

impl MetricRange {
    pub fn observe(&mut self, value: Option<f64>) {
        let Some(value) = value.filter(|value| value.is_finite()) else {
            return;
        };
        self.bounds = Some(match self.bounds {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    pub fn normalize(&self, value: Option<f64>) -> Option<f64> {
        let (lo, hi) = self.bounds?;
        normalize(value?, lo, hi)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricRanges {
    pub lead_time: MetricRange,
    pub capacity: MetricRange,
    pub trade_cost: MetricRange,
}

impl MetricRanges {
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a RawMetrics>) -> Self {
        let mut ranges = Self::default();
        for metric in metrics {
            ranges.lead_time.observe(metric.lead_time_weeks);
            ranges.capacity.observe(metric.capacity);
            ranges.trade_cost.observe(metric.trade_cost_uplift_pct);
        }
        ranges
    }
}

/// `(v - lo) / (hi - lo)` clamped to `[0, 1]`; absent for non-finite input or a degenerate range.
pub fn normalize(value: f64, lo: f64, hi: f64) -> Option<f64> {
    if !value.is_finite() || !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return None;
    }
    Some(((value - lo) / (hi - lo)).clamp(0.0, 1.0))
}

pub fn confidence_penalty(confidence: Confidence, config: &ScoringConfig) -> f64 {
    match confidence {
        Confidence::High => config.high_confidence_penalty,
        Confidence::Medium => config.medium_confidence_penalty,
        Confidence::Low | Confidence::Unknown => config.low_confidence_penalty,
    }
}

/// Weighted tightness from sub-factors. Never fails: each gap falls back to its default.
pub fn derived_index(
    metrics: &RawMetrics,
    confidence: Confidence,
    ranges: &MetricRanges,
    config: &ScoringConfig,
) -> u8 {
    let capacity_risk = ranges
        .capacity
        .normalize(metrics.capacity)
        .map(|value| 1.0 - value)
        .unwrap_or(config.missing_capacity_risk);
    let lead_time_pressure = ranges
        .lead_time
        .normalize(metrics.lead_time_weeks)
        .unwrap_or(config.missing_lead_time_pressure);
    let trade_cost_pressure = ranges
        .trade_cost
        .normalize(metrics.trade_cost_uplift_pct)
        .unwrap_or(config.missing_trade_cost_pressure);

    let weighted = config.capacity_weight * capacity_risk
        + config.lead_time_weight * lead_time_pressure
        + config.trade_cost_weight * trade_cost_pressure
        + config.confidence_weight * confidence_penalty(confidence, config);

    clamp_index(100.0 * weighted)
}

fn clamp_index(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

pub fn tier(index: u8) -> u8 {
    match index {
        80.. => 3,
        60..=79 => 2,
        40..=59 => 1,
        _ => 0,
    }
}

pub fn tightness(
    override_score: Option<f64>,
    metrics: &RawMetrics,
    confidence: Confidence,
    ranges: &MetricRanges,
    config: &ScoringConfig,
) -> Tightness {
    let (index, source) = match override_score.filter(|score| score.is_finite()) {
        Some(score) => (clamp_index(score), ScoreSource::Override),
        None => (
            derived_index(metrics, confidence, ranges, config),
            ScoreSource::Derived,
        ),
    };

    Tightness {
        index,
        tier: tier(index),
        source,
    }
}

pub fn geometry(kind: &NodeKind, layer: Layer, index: u8) -> Geometry {
    if kind.is_company() {
        return Geometry {
            width: 16.0,
            height: 16.0,
            size_class: "company".to_owned(),
        };
    }
    if kind.is_evidence() {
        return Geometry {
            width: 9.0,
            height: 9.0,
            size_class: "evidence".to_owned(),
        };
    }

    let eased = (f32::from(index) / 100.0).clamp(0.0, 1.0).powf(3.4);
    let tier = tier(index);
    let ((w_lo, w_hi), (h_lo, h_hi), size_class) = match layer {
        Layer::L1 => ((68.0, 220.0), (24.0, 82.0), format!("l1_tier_{tier}")),
        Layer::L2 => ((56.0, 196.0), (18.0, 74.0), format!("l2_tier_{tier}")),
        Layer::L3 => ((9.0, 92.0), (9.0, 92.0), format!("l3_tier_{tier}")),
        Layer::L4 => ((10.0, 52.0), (10.0, 52.0), format!("tier_{tier}")),
    };

    Geometry {
        width: lerp(w_lo, w_hi, eased).round(),
        height: lerp(h_lo, h_hi, eased).round(),
        size_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(lead: Option<f64>, capacity: Option<f64>, trade: Option<f64>) -> RawMetrics {
        RawMetrics {
            lead_time_weeks: lead,
            capacity,
            trade_cost_uplift_pct: trade,
        }
    }

    #[test]
    fn missing_metrics_score_the_documented_default() {
        let config = ScoringConfig::default();
        let ranges = MetricRanges::default();
        let empty = RawMetrics::default();
        let first = derived_index(&empty, Confidence::Unknown, &ranges, &config);
        let second = derived_index(&empty, Confidence::Unknown, &ranges, &config);
        // 100 * (0.35*0.7 + 0.25*0.6 + 0.25*0.6 + 0.15*0.75) = 65.75
        assert_eq!(first, 66);
        assert_eq!(first, second);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier(100), 3);
        assert_eq!(tier(80), 3);
        assert_eq!(tier(79), 2);
        assert_eq!(tier(60), 2);
        assert_eq!(tier(59), 1);
        assert_eq!(tier(40), 1);
        assert_eq!(tier(39), 0);
        assert_eq!(tier(0), 0);
    }

    #[test]
    fn normalize_handles_degenerate_ranges() {
        assert_eq!(normalize(5.0, 0.0, 10.0), Some(0.5));
        assert_eq!(normalize(20.0, 0.0, 10.0), Some(1.0));
        assert_eq!(normalize(5.0, 3.0, 3.0), None);
        assert_eq!(normalize(f64::NAN, 0.0, 1.0), None);
    }

    #[test]
    fn single_observation_falls_back_to_default() {
        let config = ScoringConfig::default();
        let only = metrics(Some(12.0), Some(50.0), Some(10.0));
        let ranges = MetricRanges::from_metrics([&only]);
        assert_eq!(ranges.lead_time.bounds(), Some((12.0, 12.0)));
        assert_eq!(
            derived_index(&only, Confidence::Unknown, &ranges, &config),
            derived_index(&RawMetrics::default(), Confidence::Unknown, &ranges, &config)
        );
    }

    #[test]
    fn extreme_metrics_span_the_scale() {
        let config = ScoringConfig::default();
        let tight = metrics(Some(52.0), Some(10.0), Some(40.0));
        let loose = metrics(Some(2.0), Some(1000.0), Some(0.0));
        let ranges = MetricRanges::from_metrics([&tight, &loose]);
        assert_eq!(derived_index(&tight, Confidence::Low, &ranges, &config), 96);
        assert_eq!(derived_index(&loose, Confidence::High, &ranges, &config), 2);
    }

    #[test]
    fn override_wins_and_is_clamped() {
        let config = ScoringConfig::default();
        let ranges = MetricRanges::default();
        let empty = RawMetrics::default();
        let over = tightness(Some(130.4), &empty, Confidence::High, &ranges, &config);
        assert_eq!(over.index, 100);
        assert_eq!(over.tier, 3);
        assert_eq!(over.source, ScoreSource::Override);

        let rounded = tightness(Some(79.6), &empty, Confidence::High, &ranges, &config);
        assert_eq!(rounded.index, 80);

        let derived = tightness(None, &empty, Confidence::High, &ranges, &config);
        assert_eq!(derived.source, ScoreSource::Derived);
    }

    #[test]
    fn geometry_by_kind_and_layer() {
        assert_eq!(geometry(&NodeKind::Company, Layer::L4, 90).width, 16.0);
        assert_eq!(
            geometry(&NodeKind::EvidenceGap, Layer::L4, 90).size_class,
            "evidence"
        );

        let low = geometry(&NodeKind::DomainComponent, Layer::L1, 0);
        assert_eq!((low.width, low.height), (68.0, 24.0));
        assert_eq!(low.size_class, "l1_tier_0");

        let high = geometry(&NodeKind::DomainComponent, Layer::L3, 100);
        assert_eq!((high.width, high.height), (92.0, 92.0));
        assert_eq!(high.size_class, "l3_tier_3");
    }
}
