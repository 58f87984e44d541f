// lintview - Command Line Entry Point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lintview::{AnalysisService, AnalyzerSettings, ConfigService, SettingsUpdate};
use lintview_diagnostics::{DiagnosticTree, DiagnosticTreeNode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a static analyzer and browse its results")]
struct Cli {
    /// Config file (defaults to ~/.lintview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Result cache file
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    /// Interpreter that runs the analyzer
    #[arg(long, global = true)]
    interpreter: Option<String>,

    /// Maximum number of cached targets
    #[arg(long, global = true)]
    max_entries: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a module or package and print the results
    Analyze {
        target: PathBuf,

        /// Also print the analyzer's combined output
        #[arg(long)]
        log: bool,
    },
    /// Print the cached results for a target
    Show { target: PathBuf },
    /// List cached targets, most recent first
    History {
        /// Drop targets that are no longer modules or packages first
        #[arg(long)]
        prune: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "lintview=debug" } else { "lintview=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file settings with this invocation's flags applied on top
fn load_settings(cli: &Cli) -> Result<AnalyzerSettings> {
    let service = match &cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("Failed to load configuration")?;

    let mut settings = service.get_config_clone();
    settings.apply_update(SettingsUpdate {
        interpreter: cli.interpreter.clone(),
        max_entries: cli.max_entries,
        results_file: cli.results.clone(),
        ..Default::default()
    });
    settings
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid command line settings")?;
    Ok(settings)
}

fn print_tree(tree: &DiagnosticTree) {
    println!("{}", tree.title);
    for node in &tree.nodes {
        print_node(node, 1);
    }
}

fn print_node(node: &DiagnosticTreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        DiagnosticTreeNode::Category(category) => {
            println!("{}{}", indent, category.label);
            for child in &category.children {
                print_node(child, depth + 1);
            }
        }
        DiagnosticTreeNode::Module(module) => {
            println!("{}{}", indent, module.label);
            for message in &module.children {
                println!("{}  {}", indent, message.text);
            }
        }
        DiagnosticTreeNode::Message(message) => {
            println!("{}{}", indent, message.text);
        }
    }
}

async fn analyze(service: &mut AnalysisService, target: PathBuf, log: bool) -> Result<()> {
    let handle = service
        .analyze(&target)
        .await
        .with_context(|| format!("Failed to analyze {}", target.display()))?;

    let outcome = tokio::select! {
        result = service.wait_for_completion() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling run {}", handle.run_id);
            service.cancel_current_run().await?;
            return Ok(());
        }
    };

    if log {
        if let Some(combined) = service.get_combined_log() {
            eprintln!("{}", combined);
        }
    }

    match outcome.with_context(|| format!("Analysis of {} failed", target.display()))? {
        Some(report) => {
            info!(
                "{} diagnostics, exit code {:?}",
                report.diagnostics.len(),
                report.exit_code
            );
            print_tree(&report.tree);
        }
        None => println!("No output from analyzer for {}", handle.target),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(&cli)?;
    let mut service = AnalysisService::new(settings)?;

    match cli.command {
        Command::Analyze { target, log } => analyze(&mut service, target, log).await?,
        Command::Show { target } => {
            let tree = service.get_display_tree(&target)?;
            print_tree(&tree);
        }
        Command::History { prune } => {
            if prune {
                let removed = service.prune_obsolete()?;
                info!("Removed {} obsolete targets", removed);
            }
            for target in service.history() {
                println!("{}", target.display());
            }
        }
    }

    Ok(())
}
