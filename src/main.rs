use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chronicle_layout::camera::ViewTransform;
use chronicle_layout::records::GraphInput;
use chronicle_layout::simulation::{PlacedNode, SimulationStatus};
use chronicle_layout::{GraphView, LayoutConfig, SwimlaneLayoutEngine};

/// Lay out entity/event graphs as a relationship network or a swimlane timeline.
#[derive(Parser)]
#[command(name = "chronicle-layout")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the force simulation and print settled node positions
    Layout {
        /// Graph file (.json)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout configuration (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Viewport width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Viewport height in pixels
        #[arg(long)]
        height: Option<f64>,

        /// Seed for initial placement
        #[arg(long)]
        seed: Option<u64>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Arrange events into one lane per entity
    Swimlane {
        /// Graph file (.json)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout configuration (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Result of the `layout` subcommand
#[derive(Serialize)]
struct LayoutReport {
    status: Option<SimulationStatus>,
    iterations: usize,
    width: f64,
    height: f64,
    transform: ViewTransform,
    nodes: Vec<PlacedNode>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(LayoutConfig::default()),
    }
}

fn load_input(path: &Path) -> anyhow::Result<GraphInput> {
    GraphInput::from_path(path).with_context(|| format!("failed to read graph {}", path.display()))
}

fn emit(json: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "layout written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn layout(
    input: &Path,
    config: Option<&Path>,
    width: Option<f64>,
    height: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<String> {
    let mut config = load_config(config)?;
    if let Some(width) = width {
        config.viewport.width = width;
    }
    if let Some(height) = height {
        config.viewport.height = height;
    }
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    config.validate()?;

    let model = load_input(input)?.to_model();
    let mut view = GraphView::new(config);
    view.set_graph(model);
    let report = view.settle();

    let (iterations, nodes) = match view.engine() {
        Some(engine) => (engine.iterations(), engine.placed_nodes()),
        None => (0, Vec::new()),
    };
    info!(
        nodes = nodes.len(),
        iterations,
        status = ?report.status,
        "layout settled"
    );

    let viewport = view.viewport();
    let result = LayoutReport {
        status: report.status,
        iterations,
        width: viewport.width,
        height: viewport.height,
        transform: viewport.transform,
        nodes,
    };
    Ok(serde_json::to_string_pretty(&result)?)
}

fn swimlane(input: &Path, config: Option<&Path>) -> anyhow::Result<String> {
    let config = load_config(config)?;
    let input = load_input(input)?;
    let model = input.to_model();

    let layout = SwimlaneLayoutEngine::new(config.swimlane).layout(&model, &input.documents);
    info!(
        lanes = layout.lanes.len(),
        events = layout.events.len(),
        fallback = layout.fallback,
        "swimlane arranged"
    );
    Ok(serde_json::to_string_pretty(&layout)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chronicle_layout=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout {
            input,
            config,
            width,
            height,
            seed,
            output,
        } => {
            let json = layout(&input, config.as_deref(), width, height, seed)?;
            emit(&json, output.as_deref())?;
        }
        Commands::Swimlane {
            input,
            config,
            output,
        } => {
            let json = swimlane(&input, config.as_deref())?;
            emit(&json, output.as_deref())?;
        }
    }

    Ok(())
}
