//! CLI binary for filtering and inspecting compiled pipeline IR.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use partial_run_filter::NodeSelector;
use partial_run_ir::Pipeline;

#[derive(Parser)]
#[command(name = "partial-run", version, about = "Filter compiled pipeline IR for partial runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep only the nodes between the --from and --to frontiers
    Filter {
        /// Path to the pipeline IR .json file
        pipeline: PathBuf,

        /// Start frontier node id (repeatable). Default: every node
        #[arg(long = "from", value_name = "ID")]
        from_ids: Vec<String>,

        /// End frontier node id (repeatable). Default: every node
        #[arg(long = "to", value_name = "ID")]
        to_ids: Vec<String>,

        /// Start frontier as a regex over node ids (repeatable)
        #[arg(long, value_name = "REGEX")]
        from_pattern: Vec<String>,

        /// End frontier as a regex over node ids (repeatable)
        #[arg(long, value_name = "REGEX")]
        to_pattern: Vec<String>,

        /// Where to write the filtered IR (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the orphaned input channels, keyed by removed producer
        #[arg(long)]
        orphans: Option<PathBuf>,
    },

    /// Check that a pipeline can be filtered
    Validate {
        /// Path to the pipeline IR .json file
        pipeline: PathBuf,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show information about a pipeline
    Info {
        /// Path to the pipeline IR .json file
        pipeline: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so filtered IR on stdout stays parseable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Filter {
            pipeline,
            from_ids,
            to_ids,
            from_pattern,
            to_pattern,
            output,
            orphans,
        } => {
            let from = build_selector(from_ids, &from_pattern)?;
            let to = build_selector(to_ids, &to_pattern)?;
            cmd_filter(&pipeline, &from, &to, output.as_deref(), orphans.as_deref())?;
        }
        Commands::Validate { pipeline, json } => {
            cmd_validate(&pipeline, json)?;
        }
        Commands::Info { pipeline } => {
            cmd_info(&pipeline)?;
        }
    }

    Ok(())
}

/// Combine ids and patterns for one frontier. No flags means every node.
fn build_selector(ids: Vec<String>, patterns: &[String]) -> partial_run_types::Result<NodeSelector> {
    let mut selectors = Vec::new();
    if !ids.is_empty() {
        selectors.push(NodeSelector::ids(ids));
    }
    for pattern in patterns {
        selectors.push(NodeSelector::pattern(pattern)?);
    }
    Ok(NodeSelector::any_of(selectors))
}

fn load_pipeline(path: &Path) -> anyhow::Result<Pipeline> {
    let pipeline = partial_run_ir::load(path)?;
    Ok(pipeline)
}

fn cmd_filter(
    path: &Path,
    from: &NodeSelector,
    to: &NodeSelector,
    output: Option<&Path>,
    orphans_path: Option<&Path>,
) -> anyhow::Result<()> {
    let pipeline = load_pipeline(path)?;
    let (filtered, orphans) = partial_run_filter::filter_pipeline_between(&pipeline, from, to)?;

    let json = partial_run_ir::to_json_pretty(&filtered)?;
    match output {
        Some(out) => std::fs::write(out, json)?,
        None => println!("{json}"),
    }
    if let Some(out) = orphans_path {
        std::fs::write(out, serde_json::to_string_pretty(&orphans)?)?;
    }

    tracing::info!(
        pipeline = %pipeline.pipeline_info.id,
        kept = filtered.nodes.len(),
        total = pipeline.nodes.len(),
        orphaned_producers = orphans.len(),
        "filtered pipeline"
    );
    for (producer, channels) in &orphans {
        tracing::info!(producer = %producer, channels = channels.len(), "producer removed; inputs need reconnecting");
    }
    Ok(())
}

fn cmd_validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let pipeline = load_pipeline(path)?;
    let diagnostics = partial_run_filter::diagnose(&pipeline);

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else if diagnostics.is_empty() {
        println!("Pipeline is valid");
    } else {
        for diag in &diagnostics {
            println!("[ERROR] {}: {}", diag.rule, diag.message);
        }
    }

    if !diagnostics.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let pipeline = load_pipeline(path)?;

    println!("Pipeline: {}", pipeline.pipeline_info.id);
    println!("Execution mode: {}", pipeline.execution_mode.as_str());
    println!("Nodes: {}", pipeline.nodes.len());
    let sub_pipelines = pipeline.nodes.len() - pipeline.pipeline_nodes().count();
    if sub_pipelines > 0 {
        println!("Sub-pipelines: {}", sub_pipelines);
    }
    match &pipeline.deployment_config {
        Some(config) => println!(
            "Deployment config: {} executor specs, {} custom drivers, {} platform configs",
            config.executor_specs.len(),
            config.custom_driver_specs.len(),
            config.node_level_platform_configs.len()
        ),
        None => println!("Deployment config: (none)"),
    }

    println!("\nNodes:");
    for node in pipeline.pipeline_nodes() {
        println!(
            "  {} upstream=[{}] downstream=[{}]",
            node.id(),
            node.upstream_nodes.join(", "),
            node.downstream_nodes.join(", ")
        );
    }

    Ok(())
}
