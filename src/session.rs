use std::collections::VecDeque;

use eframe::egui::Vec2;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use crate::classify::Spotlight;
use crate::config::EngineConfig;
use crate::disclosure::{DisclosureIndex, ExpansionState, VisibleElements, compute_visible_elements};
use crate::error::LayoutError;
use crate::graph::model::Graph;
use crate::highlight::{self, Highlight};
use crate::layout::diagnostics::{LayoutDiagnostics, compute_diagnostics};
use crate::layout::{Camera, DomainCells, LayoutGraph, LayoutOutcome, run_layout};
use crate::transition::{Snapshot, Transition, TransitionKind};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Accordion navigation: collapse every other domain, then toggle this one.
    SelectDomain(String),
    /// Toggle one domain without touching the others.
    ToggleDomain(String),
    ExpandAll,
    CollapseAll,
    Resize(Vec2),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    Deferred,
    Ignored,
}

/// Owns the graph and every piece of mutable view state around it.
///
/// All mutation goes through `dispatch`; while a transition is animating, further commands
/// queue up and run in arrival order once it commits.
pub struct GraphSession {
    graph: Graph,
    config: EngineConfig,
    disclosure: DisclosureIndex,
    expansion: ExpansionState,
    layout: LayoutGraph,
    outcome: LayoutOutcome,
    viewport: Vec2,
    camera: Camera,
    transition: Option<Transition>,
    pending: VecDeque<Command>,
}

impl GraphSession {
    pub fn new(graph: Graph, config: EngineConfig, viewport: Vec2) -> Result<Self, LayoutError> {
        let disclosure =
            DisclosureIndex::build(&graph, config.layout.disclosure.hotspots_per_domain);
        let expansion = ExpansionState::new();
        let mut layout = LayoutGraph::from_visible(&compute_visible_elements(
            &graph,
            &expansion,
            config.layout.disclosure.hotspots_per_domain,
        ));
        let outcome = run_layout(&mut layout, &expansion, viewport, &config.layout)?;
        let camera = outcome.density.camera;

        Ok(Self {
            graph,
            config,
            disclosure,
            expansion,
            layout,
            outcome,
            viewport,
            camera,
            transition: None,
            pending: VecDeque::new(),
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn disclosure(&self) -> &DisclosureIndex {
        &self.disclosure
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn layout(&self) -> &LayoutGraph {
        &self.layout
    }

    pub fn outcome(&self) -> &LayoutOutcome {
        &self.outcome
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn domain_cell_bounds(&self) -> &DomainCells {
        &self.outcome.cells
    }

    pub fn visible(&self) -> VisibleElements<'_> {
        compute_visible_elements(
            &self.graph,
            &self.expansion,
            self.config.layout.disclosure.hotspots_per_domain,
        )
    }

    pub fn diagnostics(&self) -> LayoutDiagnostics {
        compute_diagnostics(&self.layout, &self.outcome, self.viewport)
    }

    /// Domain key for a free-text query: exact key, then exact label, then best fuzzy hit over
    /// keys and labels (first key wins ties).
    pub fn resolve_domain(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let keys = self.graph.domain_keys();
        let catalog = &self.config.layout.domains;
        if let Some(key) = keys.iter().find(|key| key.eq_ignore_ascii_case(query)) {
            return Some(key.clone());
        }
        if let Some(key) = keys
            .iter()
            .find(|key| catalog.label_for(key).eq_ignore_ascii_case(query))
        {
            return Some(key.clone());
        }

        let matcher = SkimMatcherV2::default();
        let mut best: Option<(i64, &String)> = None;
        for key in &keys {
            let score = [key.clone(), catalog.label_for(key)]
                .iter()
                .filter_map(|text| fuzzy_match_score(&matcher, text, query))
                .max();
            if let Some(score) = score
                && best.is_none_or(|(top, _)| score > top)
            {
                best = Some((score, key));
            }
        }
        best.map(|(_, key)| key.clone())
    }

    pub fn highlight_chain(&self, id: &str) -> Option<Highlight> {
        highlight::chain_by_id(&self.layout, id)
    }

    pub fn spotlight(&self, theme: Spotlight) -> Highlight {
        highlight::spotlight(&self.layout, theme)
    }

    pub fn select(&mut self, domain: &str) -> Result<Dispatch, LayoutError> {
        self.dispatch(Command::SelectDomain(domain.to_owned()))
    }

    pub fn toggle(&mut self, domain: &str) -> Result<Dispatch, LayoutError> {
        self.dispatch(Command::ToggleDomain(domain.to_owned()))
    }

    pub fn expand_all(&mut self) -> Result<Dispatch, LayoutError> {
        self.dispatch(Command::ExpandAll)
    }

    pub fn collapse_all(&mut self) -> Result<Dispatch, LayoutError> {
        self.dispatch(Command::CollapseAll)
    }

    // Unknown domains are rejected before anything is queued.
    pub fn dispatch(&mut self, command: Command) -> Result<Dispatch, LayoutError> {
        if let Command::SelectDomain(domain) | Command::ToggleDomain(domain) = &command
            && !self.graph.domain_keys().iter().any(|key| key == domain)
        {
            return Err(LayoutError::UnknownDomain(domain.clone()));
        }

        if self.transition.is_some() {
            debug!(?command, queued = self.pending.len() + 1, "command deferred");
            self.pending.push_back(command);
            return Ok(Dispatch::Deferred);
        }

        self.apply(command)
    }

    pub fn relayout(&mut self) -> Result<&LayoutOutcome, LayoutError> {
        if self.transition.is_some() {
            return Err(LayoutError::LayoutInProgress);
        }
        self.refresh(None)?;
        Ok(&self.outcome)
    }

    /// Drives the in-flight transition. On commit, deferred commands run in order until one of
    /// them starts a new transition. Returns whether a transition committed.
    pub fn advance(&mut self, dt_ms: f32) -> Result<bool, LayoutError> {
        let Some(transition) = self.transition.as_mut() else {
            return Ok(false);
        };
        if !transition.advance(dt_ms) {
            return Ok(false);
        }

        self.transition = None;
        debug!(pending = self.pending.len(), "transition committed");
        while self.transition.is_none() {
            let Some(command) = self.pending.pop_front() else {
                break;
            };
            self.apply(command)?;
        }
        Ok(true)
    }

    pub fn settle(&mut self) -> Result<(), LayoutError> {
        while let Some(transition) = &self.transition {
            let remaining = transition.duration_ms() + 1.0;
            self.advance(remaining)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<Dispatch, LayoutError> {
        let before = self.expansion.clone();
        match command {
            Command::SelectDomain(domain) => {
                self.expansion.select_accordion(&domain);
            }
            Command::ToggleDomain(domain) => {
                self.expansion.toggle(&domain);
            }
            Command::ExpandAll => {
                let keys = self.graph.domain_keys();
                self.expansion.expand_all(keys);
            }
            Command::CollapseAll => self.expansion.collapse_all(),
            Command::Resize(viewport) => {
                if viewport == self.viewport {
                    return Ok(Dispatch::Ignored);
                }
                self.viewport = viewport;
                self.refresh(None)?;
                return Ok(Dispatch::Applied);
            }
        }

        if self.expansion == before {
            return Ok(Dispatch::Ignored);
        }
        let kind = if self.expansion.len() < before.len() {
            TransitionKind::Collapse
        } else {
            TransitionKind::Expand
        };
        self.refresh(Some(kind))?;
        Ok(Dispatch::Applied)
    }

    fn refresh(&mut self, animate: Option<TransitionKind>) -> Result<(), LayoutError> {
        let snapshot = Snapshot::capture(&self.layout);
        let visible = compute_visible_elements(
            &self.graph,
            &self.expansion,
            self.config.layout.disclosure.hotspots_per_domain,
        );
        self.layout.rebuild(&visible);
        self.outcome = run_layout(
            &mut self.layout,
            &self.expansion,
            self.viewport,
            &self.config.layout,
        )?;
        self.camera = self.outcome.density.camera;

        self.transition = animate
            .filter(|_| !snapshot.is_empty())
            .map(|kind| {
                Transition::between(&snapshot, &self.layout, kind, &self.config.layout.transition)
            })
            .filter(|transition| !transition.is_finished());
        Ok(())
    }
}
