use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chokepoint::graph::{build_graph, load_dataset};
use chokepoint::classify::Spotlight;
use chokepoint::report::{LayoutReport, SpotlightReport, TopReport};
use chokepoint::{EngineConfig, GraphSession};
use clap::{Args, Parser, Subcommand};
use eframe::egui::{Vec2, vec2};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "chokepoint", author, version, about)]
struct Cli {
    /// Log filter for stderr, e.g. `debug` or `chokepoint=trace`; overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lay out the visible graph and print positions, cells and camera as JSON
    Layout {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the highest-tightness components and graph totals
    Top {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print readability diagnostics for a layout
    Diagnose {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the visible nodes of one theme, their domain anchors and the edges among them
    Spotlight {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        view: ViewArgs,
        /// sensors, camera_payload or assembly_integration
        #[arg(long, value_parser = parse_spotlight)]
        theme: Spotlight,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Dataset JSON with `nodes`, `edges`, optional `tightness_overrides` and `whitelist`
    #[arg(long)]
    input: PathBuf,
    /// Engine configuration JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep only whitelisted L1-L3 components
    #[arg(long)]
    components_only: bool,
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1440x920", value_parser = parse_viewport)]
    viewport: Vec2,
    /// Expand the domain best matching this key or label
    #[arg(long, conflicts_with = "expand_all")]
    expand: Option<String>,
    /// Expand every domain
    #[arg(long)]
    expand_all: bool,
}

fn parse_viewport(raw: &str) -> Result<Vec2, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or_else(|| format!("invalid viewport dimension {value:?}"))
    };
    Ok(vec2(parse(width)?, parse(height)?))
}

fn parse_spotlight(raw: &str) -> Result<Spotlight, String> {
    Spotlight::from_key(raw).ok_or_else(|| {
        let known = Spotlight::ALL.map(Spotlight::key).join(", ");
        format!("unknown theme {raw:?}, expected one of {known}")
    })
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn open_session(input: &InputArgs, viewport: Vec2) -> Result<GraphSession> {
    let mut config = match &input.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if input.components_only {
        config.classifier.components_only = true;
    }

    let dataset = load_dataset(&input.input)?;
    let graph = build_graph(&dataset, &config);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph built"
    );

    GraphSession::new(graph, config, viewport).context("initial layout failed")
}

fn apply_view(session: &mut GraphSession, view: &ViewArgs) -> Result<()> {
    if view.expand_all {
        session.expand_all()?;
    } else if let Some(query) = &view.expand {
        let Some(domain) = session.resolve_domain(query) else {
            bail!("no domain matches {query:?}");
        };
        info!(%query, %domain, "expanding domain");
        session.select(&domain)?;
    }
    session.settle()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("failed to write JSON")?;
    writeln!(out).context("failed to write JSON")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::Layout { input, view } => {
            let mut session = open_session(&input, view.viewport)?;
            apply_view(&mut session, &view)?;
            let report = LayoutReport::from_session(&session);
            info!(
                nodes = report.nodes.len(),
                cells = report.cells.len(),
                zoom = report.camera.zoom,
                "layout complete"
            );
            print_json(&report)
        }
        Command::Top { input, limit } => {
            let session = open_session(&input, vec2(1440.0, 920.0))?;
            print_json(&TopReport::from_session(&session, limit))
        }
        Command::Diagnose { input, view } => {
            let mut session = open_session(&input, view.viewport)?;
            apply_view(&mut session, &view)?;
            let diagnostics = session.diagnostics();
            info!(
                label_collisions = diagnostics.label_collisions,
                edge_crossings = diagnostics.edge_crossings,
                "diagnostics computed"
            );
            print_json(&diagnostics)
        }
        Command::Spotlight { input, view, theme } => {
            let mut session = open_session(&input, view.viewport)?;
            apply_view(&mut session, &view)?;
            let report = SpotlightReport::from_session(&session, theme);
            info!(
                theme = theme.key(),
                nodes = report.path_nodes,
                edges = report.path_edges,
                "spotlight computed"
            );
            print_json(&report)
        }
    }
}
