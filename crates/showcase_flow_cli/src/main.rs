// SPDX-License-Identifier: MIT OR Apache-2.0
//! `showcase_flow` - headless host for the flow canvas.
//!
//! Loads a project's flow from a `content.json` collection document, seeds
//! the layout and then:
//! - prints the scene and its routed edges (`inspect`)
//! - renders the fixed-resolution export (`export-image`)
//! - merges the laid-out flow back into the collection (`save-layout`)
//! - writes the settings in effect to `flow.ron` (`init-settings`)

mod sink;
mod source;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use egui::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use showcase_flow::config::SETTINGS_FILE_NAME;
use showcase_flow::export::export_file_name;
use showcase_flow::{
    ExportError, FlowCanvas, FlowError, FlowSettings, ProjectRef, SoftwareRasterizer, ToastLog,
};
use sink::FileSink;
use source::{load_project, LoadedProject};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Flow canvas tools for showcase projects
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file (RON); `flow.ron` in the working directory or built-in
    /// defaults when omitted
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Path to the collection document
    #[arg(short, long, default_value = "content.json")]
    content: PathBuf,
    /// Index of the project in the collection
    #[arg(short, long)]
    project: Option<usize>,
    /// Project title, used when no index is given or it is out of range
    #[arg(short, long)]
    title: Option<String>,
    /// Seed for placing unpositioned nodes
    #[arg(long)]
    seed: Option<u64>,
    /// Width of the view used for layout seeding
    #[arg(long, default_value_t = 1280.0)]
    view_width: f32,
    /// Height of the view used for layout seeding
    #[arg(long, default_value_t = 720.0)]
    view_height: f32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print nodes and routed edges
    Inspect {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Render the whole flow into a fixed-size image
    ExportImage {
        #[command(flatten)]
        project: ProjectArgs,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Date used in the file name (YYYY-MM-DD); today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
    },
    /// Write the laid-out flow back into the collection document
    SaveLayout {
        #[command(flatten)]
        project: ProjectArgs,
        /// Output file; `content.updated.json` next to the input when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write the settings in effect to a RON file
    InitSettings {
        /// Output file
        #[arg(short, long, default_value = SETTINGS_FILE_NAME)]
        out: PathBuf,
    },
}

/// Image export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Raster image from the software rasterizer
    Png,
    /// Vector image with labels
    Svg,
}

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["showcase_flow=debug", "showcase_flow_cli=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FlowError> {
    let settings = match &cli.settings {
        Some(path) => FlowSettings::load(path)?,
        None => FlowSettings::load_or_default(Path::new("."))?,
    };
    let toasts = Arc::new(ToastLog::new());
    let mut canvas = FlowCanvas::new(settings).with_notifier(toasts.clone());

    let result = match cli.command {
        Command::Inspect { project } => {
            open(&mut canvas, &project).await?;
            inspect(&canvas);
            Ok(())
        }
        Command::ExportImage {
            project,
            out,
            date,
            format,
        } => {
            open(&mut canvas, &project).await?;
            let date = sink::date_stamp(date.unwrap_or_else(sink::today));
            let mut sink = FileSink {
                layout_path: project.content.clone(),
                image_dir: out,
            };
            export(&canvas, &mut sink, &date, format).await
        }
        Command::SaveLayout { project, out } => {
            let loaded = open(&mut canvas, &project).await?;
            let layout_path =
                out.unwrap_or_else(|| project.content.with_file_name("content.updated.json"));
            let mut sink = FileSink {
                layout_path,
                image_dir: PathBuf::from("."),
            };
            canvas
                .save_layout(loaded.content, &loaded.project, &mut sink)
                .map(|outcome| tracing::info!("Flow stored in collection[{}]", outcome.index))
                .map_err(FlowError::from)
        }
        Command::InitSettings { out } => {
            canvas.settings().save(&out)?;
            tracing::info!("Wrote {}", out.display());
            Ok(())
        }
    };

    for toast in toasts.drain() {
        println!("[{:?}] {}", toast.level, toast.message);
    }
    result
}

async fn open(canvas: &mut FlowCanvas, args: &ProjectArgs) -> Result<LoadedProject, FlowError> {
    let project = ProjectRef {
        index: args.project,
        title: args.title.clone(),
    };
    let loaded = load_project(&args.content, project).await?;
    let view_size = Vec2::new(args.view_width, args.view_height);
    match args.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            canvas.activate_with_rng(loaded.flow.clone(), view_size, &mut rng);
        }
        None => canvas.activate(loaded.flow.clone(), view_size),
    }
    Ok(loaded)
}

fn inspect(canvas: &FlowCanvas) {
    let fallback = canvas.fallback_node_size();
    let scene = canvas.scene();
    println!("{} nodes, {} edges", scene.node_count(), scene.edge_count());
    for state in scene.nodes() {
        let rect = state.rect(fallback);
        println!(
            "  node {:<16} {:<24} at ({:.0}, {:.0}) size {:.0}x{:.0} [{}]",
            state.id().as_str(),
            state.node.label,
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height(),
            state.node.kind()
        );
    }
    for route in canvas.routes() {
        let edge = &scene.edges()[route.edge_index];
        println!(
            "  edge {} -> {}: {:?} -> {:?} ({:?}) {}",
            edge.from,
            edge.to,
            route.start_handle,
            route.end_handle,
            route.orientation,
            route.svg_path()
        );
    }
    let skipped = scene.edge_count() - canvas.routes().len();
    if skipped > 0 {
        println!("  {skipped} edges skipped (unknown endpoints)");
    }
}

async fn export(
    canvas: &FlowCanvas,
    sink: &mut FileSink,
    date: &str,
    format: OutputFormat,
) -> Result<(), FlowError> {
    match format {
        OutputFormat::Png => {
            let exported = canvas.export_image(&SoftwareRasterizer::default()).await?;
            let file_name = exported.save(sink, date)?;
            tracing::info!("Saved {file_name}");
        }
        OutputFormat::Svg => {
            let svg = canvas.export_svg().ok_or(ExportError::EmptyScene)?;
            let file_name = export_file_name(date).replace(".png", ".svg");
            tokio::fs::create_dir_all(&sink.image_dir).await?;
            let path = sink.image_dir.join(&file_name);
            tokio::fs::write(&path, svg).await?;
            tracing::info!("Saved {}", path.display());
        }
    }
    Ok(())
}
