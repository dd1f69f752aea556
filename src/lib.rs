// src/lib.rs

pub mod cli;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod errors;
pub mod logging;
pub mod types;
pub mod workspace;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, OutputFormat};
use crate::config::load_and_validate;
use crate::config::ConfigFile;
use crate::control::{ControlEngine, ExecutionContext, LocalControlEngine, QueryClient, StaticClient};
use crate::dashboard::{CheckRun, DashboardExecutionTree, DashboardNodeRun};
use crate::types::RunStatus;
use crate::workspace::{DashboardLeafNode, LocalWorkspace, ModResources, Workspace};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - workspace, query client and control engine
/// - the dashboard execution tree
/// - an event logger draining the workspace channel
/// - Ctrl-C handling (cancels the execution context)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config from '{}'", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (workspace, mut events_rx) = LocalWorkspace::new(ModResources::from_config(&cfg));
    let workspace: Arc<dyn Workspace> = Arc::new(workspace);
    let client: Arc<dyn QueryClient> = Arc::new(StaticClient::new());
    let engine: Arc<dyn ControlEngine> =
        Arc::new(LocalControlEngine::new(cfg.config.max_parallel));

    let tree = DashboardExecutionTree::new(
        cfg.dashboard.name.clone(),
        args.session_id.clone(),
        workspace,
        client,
        engine,
    );
    let leaves = tree.build_dashboard(cfg.dashboard.title.as_deref(), &cfg.dashboard.children)?;

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            debug!(
                event = event.kind(),
                session = event.session(),
                leaf = event.leaf_name(),
                "dashboard event"
            );
        }
    });

    let ctx = ExecutionContext::new();
    {
        let cancel = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling execution");
            cancel.cancel();
        });
    }

    let status = tree.execute(&ctx).await?;

    match args.output {
        OutputFormat::Text => print_text_report(&leaves),
        OutputFormat::Json => print_json_report(&leaves)?,
    }

    // Dropping the tree drops the workspace and closes the event channel.
    drop(leaves);
    drop(tree);
    drop(ctx);
    event_logger.await?;

    if status == RunStatus::Error {
        bail!("dashboard '{}' finished with errors", cfg.dashboard.name);
    }
    Ok(())
}

fn print_text_report(leaves: &[Arc<CheckRun>]) {
    for leaf in leaves {
        println!("{} [{}] {}", leaf.name(), leaf.node_type(), leaf.run_status());
        if let Some(title) = leaf.title() {
            println!("    title: {title}");
        }
        if let Some(err) = leaf.error() {
            println!("    error: {err}");
        }
        if let Some(tree) = leaf.execution_tree() {
            let summary = tree.summary();
            println!(
                "    ok: {}  alarm: {}  info: {}  skip: {}  error: {}",
                summary.ok, summary.alarm, summary.info, summary.skip, summary.error
            );
            for control in tree.control_runs() {
                let state = control.state();
                match state.error {
                    Some(err) => println!("      {} error: {err}", control.control_id()),
                    None => println!(
                        "      {} {} rows",
                        control.control_id(),
                        state.rows.len()
                    ),
                }
            }
        }
    }
}

fn print_json_report(leaves: &[Arc<CheckRun>]) -> Result<()> {
    let runs: Vec<&CheckRun> = leaves.iter().map(|leaf| leaf.as_ref()).collect();
    let json = serde_json::to_string_pretty(&runs).context("serializing run report")?;
    println!("{json}");
    Ok(())
}

/// Simple dry-run output: print the dashboard and the resources it references.
fn print_dry_run(cfg: &ConfigFile) {
    println!("checkrun dry-run");
    println!("  config.max_parallel = {}", cfg.config.max_parallel);
    println!();

    println!("dashboard {}:", cfg.dashboard.name);
    if let Some(ref title) = cfg.dashboard.title {
        println!("  title: {title}");
    }

    let resources = ModResources::from_config(cfg);
    for child in &cfg.dashboard.children {
        match resources.leaf_node(child) {
            Some(node) => println!("  - {child} ({})", node.block_type()),
            None => println!("  - {child} (not defined)"),
        }
        if let Some(benchmark) = resources.benchmark(child) {
            for nested in &benchmark.children {
                println!("      {nested}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
