use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace};

use super::load::{RawDataset, RawNode, metric_value};
use super::model::{Confidence, Edge, Graph, Layer, Node, RawMetrics, RelationType};
use crate::classify::{Classification, Classifier, ComponentWhitelist, OTHER_DOMAIN};
use crate::config::EngineConfig;
use crate::scoring::{MetricRanges, geometry, tightness};

struct Staged<'a> {
    raw: &'a RawNode,
    class: Classification,
    label: String,
    metrics: RawMetrics,
    override_score: Option<f64>,
}

// Duplicate node ids keep their first record. Edges with a missing endpoint are dropped.
pub fn build_graph(dataset: &RawDataset, config: &EngineConfig) -> Graph {
    let classifier = Classifier::new(&config.classifier);
    let whitelist = ComponentWhitelist::from_entries(&dataset.whitelist);
    let overrides = dataset
        .tightness_overrides
        .iter()
        .filter_map(|row| row.score().map(|score| (row.node_id.as_str(), score)))
        .collect::<HashMap<_, _>>();

    let mut seen = HashSet::new();
    let mut staged = Vec::with_capacity(dataset.nodes.len());
    for raw in &dataset.nodes {
        if !seen.insert(raw.id.as_str()) {
            debug!(id = %raw.id, "duplicate node id ignored");
            continue;
        }

        let class = classifier.classify(raw);
        if config.classifier.components_only
            && !(class.layer.is_core() && whitelist.admits(&raw.id, class.layer))
        {
            debug!(id = %raw.id, layer = class.layer.label(), "rejected by component whitelist");
            continue;
        }

        staged.push(Staged {
            raw,
            class,
            label: raw
                .label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .unwrap_or(&raw.id)
                .to_owned(),
            metrics: RawMetrics {
                lead_time_weeks: raw.lead_time_weeks.as_ref().and_then(metric_value),
                capacity: raw.capacity.as_ref().and_then(metric_value),
                trade_cost_uplift_pct: raw.trade_cost_uplift_pct.as_ref().and_then(metric_value),
            },
            override_score: overrides.get(raw.id.as_str()).copied(),
        });
    }

    let ranges = MetricRanges::from_metrics(staged.iter().map(|entry| &entry.metrics));
    let mut nodes = staged
        .into_iter()
        .map(|entry| {
            let confidence = entry
                .raw
                .confidence
                .as_deref()
                .map(Confidence::from_text)
                .unwrap_or_default();
            let tightness = tightness(
                entry.override_score,
                &entry.metrics,
                confidence,
                &ranges,
                &config.scoring,
            );
            Node {
                id: entry.raw.id.clone(),
                label: entry.label,
                layer: entry.class.layer,
                geometry: geometry(&entry.class.kind, entry.class.layer, tightness.index),
                domain_key: entry.class.domain_key,
                kind: entry.class.kind,
                parent_id: entry
                    .raw
                    .parent_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|parent| !parent.is_empty())
                    .map(str::to_owned),
                metrics: entry.metrics,
                confidence,
                category: entry.class.category,
                spotlight: entry.class.category.spotlight(),
                tightness,
            }
        })
        .collect::<Vec<_>>();

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let mut dropped = 0usize;
    let edges = dataset
        .edges
        .iter()
        .filter_map(|raw| {
            if !index_by_id.contains_key(&raw.source) || !index_by_id.contains_key(&raw.target) {
                dropped += 1;
                trace!(source = %raw.source, target = %raw.target, "dangling edge dropped");
                return None;
            }
            Some(Edge {
                id: raw
                    .id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("{}__{}", raw.source, raw.target)),
                source: raw.source.clone(),
                target: raw.target.clone(),
                relation: raw
                    .relation_type
                    .as_deref()
                    .map(RelationType::parse)
                    .unwrap_or(RelationType::DependsOn),
                confidence: raw
                    .confidence
                    .as_deref()
                    .map(Confidence::from_text)
                    .unwrap_or_default(),
            })
        })
        .collect::<Vec<_>>();
    if dropped > 0 {
        debug!(dropped, "dropped edges with missing endpoints");
    }

    infer_missing_parents(&mut nodes, &edges, &index_by_id);
    assign_company_domains(&mut nodes, &edges, &index_by_id);

    debug!(nodes = nodes.len(), edges = edges.len(), "graph built");
    Graph::new(nodes, edges)
}

// L3 nodes without an explicit parent adopt the source of a `decomposes_to` edge
// from an L2 node in the same domain.
fn infer_missing_parents(nodes: &mut [Node], edges: &[Edge], index_by_id: &HashMap<String, usize>) {
    let mut inferred = HashMap::new();
    for edge in edges.iter().filter(|edge| edge.relation.is_hierarchy()) {
        let source = &nodes[index_by_id[&edge.source]];
        let target = &nodes[index_by_id[&edge.target]];
        if source.layer == Layer::L2
            && target.layer == Layer::L3
            && target.parent_id.is_none()
            && source.domain_key == target.domain_key
        {
            inferred
                .entry(index_by_id[&edge.target])
                .or_insert_with(|| source.id.clone());
        }
    }

    for (index, parent) in inferred {
        nodes[index].parent_id = Some(parent);
    }
}

// Companies left in "other" join the domain they share the most edges with.
fn assign_company_domains(
    nodes: &mut [Node],
    edges: &[Edge],
    index_by_id: &HashMap<String, usize>,
) {
    let mut votes: HashMap<usize, BTreeMap<String, usize>> = HashMap::new();
    for edge in edges {
        let source = index_by_id[&edge.source];
        let target = index_by_id[&edge.target];
        for (company, other) in [(source, target), (target, source)] {
            if nodes[company].kind.is_company()
                && nodes[company].domain_key == OTHER_DOMAIN
                && nodes[other].domain_key != OTHER_DOMAIN
            {
                *votes
                    .entry(company)
                    .or_default()
                    .entry(nodes[other].domain_key.clone())
                    .or_default() += 1;
            }
        }
    }

    for (company, counts) in votes {
        let mut best: Option<(&String, usize)> = None;
        for (domain, &count) in &counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((domain, count));
            }
        }
        if let Some((domain, _)) = best {
            trace!(id = %nodes[company].id, domain = %domain, "company domain inferred");
            nodes[company].domain_key = domain.clone();
        }
    }
}
