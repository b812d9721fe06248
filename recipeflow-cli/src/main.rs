use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Import from recipeflow-core
use recipeflow_core::{Pipeline, PipelineConfig, StepProfiler};

#[derive(Parser)]
#[command(name = "recipeflow")]
#[command(about = "Seed, export, normalize, validate and analyze recipe data")]
struct Args {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Root directory for generated files (overrides the config)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable timing of every pipeline stage
    #[arg(long, global = true)]
    profile: bool,

    /// Debug-level diagnostics (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Populate the document store with the candidate and synthetic recipes
    Seed,
    /// Dump every collection to raw_json/<collection>.json
    Export,
    /// Normalize the JSON dumps into csv/*.csv
    Transform,
    /// Validate the csv tables and write validation_report.json
    Validate,
    /// Write analytics/insights.md and the charts
    Analyze {
        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },
    /// export, transform, validate and analyze in sequence
    Run {
        /// Seed the store first
        #[arg(long)]
        seed: bool,
        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },
    /// Print the document count per collection
    Count,
    /// Delete generated outputs
    Cleanup,
    /// Print the effective config as YAML and exit
    ShowConfig,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Seed => "Seed",
            Command::Export => "Export",
            Command::Transform => "Transform",
            Command::Validate => "Validation",
            Command::Analyze { .. } => "Analytics",
            Command::Run { .. } => "Pipeline run",
            Command::Count => "Count",
            Command::Cleanup => "Cleanup",
            Command::ShowConfig => "Show config",
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let command = args.command;
    if let Err(e) = run(args) {
        eprintln!("❌ {} failed: {e:#}", command.name());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args);

    if args.command == Command::ShowConfig {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    println!("🦀 Recipeflow");
    let pipeline = Pipeline::from_config(config)?;
    let mut profiler = StepProfiler::new(args.profile);

    match args.command {
        Command::Seed => {
            profiler.time_step("Seed", || pipeline.seed())?;
        }
        Command::Export => {
            profiler.time_step("Export", || pipeline.export())?;
        }
        Command::Transform => {
            profiler.time_step("Transform", || pipeline.transform())?;
        }
        Command::Validate => {
            profiler.time_step("Validate", || pipeline.validate())?;
        }
        Command::Analyze { .. } => {
            profiler.time_step("Analyze", || pipeline.analyze())?;
        }
        Command::Run { seed, .. } => {
            let summary = pipeline.run_all(seed, &mut profiler)?;
            println!("\n✅ Pipeline complete");
            println!("📊 Run metrics:");
            println!("   - Documents exported: {}", summary.exported.total());
            println!("   - Rows normalized: {}", summary.rows);
            println!(
                "   - Rows valid / invalid: {} / {}",
                summary.report.total_valid(),
                summary.report.total_invalid()
            );
            println!("   - Charts written: {}", summary.analytics.charts.written.len());
        }
        Command::Count => {
            pipeline.count();
        }
        Command::Cleanup => {
            pipeline.cleanup()?;
        }
        Command::ShowConfig => {}
    }

    profiler.print_summary();
    Ok(())
}

/// Config file (or defaults), then environment, then command-line flags.
fn load_config(args: &Args) -> PipelineConfig {
    let mut config = PipelineConfig::load_with_fallback(args.config.as_deref()).with_env_overrides();

    if let Some(config_path) = &args.config {
        tracing::debug!(path = %config_path, "config loaded");
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Command::Analyze { no_charts: true } | Command::Run { no_charts: true, .. } = args.command {
        config.analytics.charts = false;
    }
    config
}
