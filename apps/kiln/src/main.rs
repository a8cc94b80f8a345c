//! kiln - declarative build pipeline for source packages
//!
//! Parses a YAML recipe, fetches and verifies the source archive, runs the
//! build steps in an isolated environment, installs the staged artifact into
//! a prefix, and runs the recipe's acceptance test.

mod cli;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, ColorChoice, Commands};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use kiln_builder::{
    parse_recipe_file, render_pkg_config, BuildConfig, BuildContext, Builder, Recipe,
};
use kiln_events::EventReceiver;
use std::path::PathBuf;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    logging::init_tracing(json_mode, cli.global.debug);

    match cli.global.color {
        Some(ColorChoice::Always) => console::set_colors_enabled(true),
        Some(ColorChoice::Never) => console::set_colors_enabled(false),
        Some(ColorChoice::Auto) | None => {}
    }

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            println!(
                "{}",
                serde_json::json!({ "status": "error", "error": e.to_string() })
            );
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting kiln v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build {
            recipe,
            prefix,
            build_root,
            jobs,
            timeout,
            keep_scratch,
        } => {
            build(
                recipe,
                prefix,
                build_root,
                jobs,
                timeout,
                keep_scratch,
                &cli.global,
            )
            .await
        }

        Commands::Check { recipe } => check(recipe, cli.global.json).await,

        Commands::RenderPc { recipe, prefix } => render_pc(recipe, &prefix).await,
    }
}

/// Run the full pipeline with live event display and Ctrl-C cancellation
async fn build(
    recipe_path: PathBuf,
    prefix: PathBuf,
    build_root: Option<PathBuf>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    keep_scratch: bool,
    global: &cli::GlobalArgs,
) -> Result<(), CliError> {
    let recipe = parse_recipe_file(&recipe_path).await?;

    let mut config = BuildConfig::new().with_keep_scratch(keep_scratch);
    if let Some(root) = build_root {
        config = config.with_build_root(root);
    }
    if let Some(jobs) = jobs {
        config = config.with_jobs(jobs);
    }
    if let Some(seconds) = timeout {
        config = config.with_step_timeout(seconds);
    }

    // Ctrl-C flips the cancellation flag; the running step is killed and the
    // pipeline reports which step was interrupted.
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let (event_sender, event_receiver) = kiln_events::channel();
    let context = BuildContext::new(
        recipe.metadata.name.clone(),
        recipe.metadata.version.clone(),
        recipe_path,
        prefix,
    )
    .with_event_sender(event_sender);

    let builder = Builder::with_config(config).with_cancellation(cancel_rx);
    let mut event_handler = EventHandler::new(global.debug);
    let report =
        build_with_events(&builder, context, event_receiver, &mut event_handler).await?;

    if global.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": "ok",
                "report": report,
            }))
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?
        );
    } else {
        println!(
            "Built {} {} into {}",
            report.name,
            report.version,
            report.prefix.display()
        );
        println!("  files installed: {}", report.files_installed);
        if let Some(observed) = &report.observed {
            println!("  verified: {observed}");
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Drive the pipeline while draining events concurrently
async fn build_with_events(
    builder: &Builder,
    context: BuildContext,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<kiln_builder::BuildReport, CliError> {
    let mut build_future = Box::pin(builder.build(&context));

    loop {
        select! {
            result = &mut build_future => {
                // Drain any remaining events before returning
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for the build */ }
                }
            }
        }
    }
}

/// Parse and validate a recipe without running anything
async fn check(recipe_path: PathBuf, json: bool) -> Result<(), CliError> {
    let recipe = parse_recipe_file(&recipe_path).await?;

    if json {
        println!("{}", check_summary(&recipe));
    } else {
        println!(
            "{} {}: {} build steps, checksum {}",
            recipe.metadata.name,
            recipe.metadata.version,
            recipe.build.steps.len(),
            recipe.source.fetch.checksum.algorithm()
        );
        if !recipe.metadata.dependencies.build.is_empty() {
            println!(
                "  build deps: {}",
                recipe.metadata.dependencies.build.join(", ")
            );
        }
    }
    Ok(())
}

/// JSON summary of a parsed recipe for `check --json`
fn check_summary(recipe: &Recipe) -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "name": recipe.metadata.name,
        "version": recipe.metadata.version,
        "steps": recipe.build.steps.len(),
        "build_dependencies": recipe.metadata.dependencies.build,
    })
}

/// Render the pkg-config file a recipe would install
async fn render_pc(recipe_path: PathBuf, prefix: &std::path::Path) -> Result<(), CliError> {
    let recipe = parse_recipe_file(&recipe_path).await?;

    if recipe.install.pkgconfig.is_none() {
        return Err(CliError::InvalidArguments(format!(
            "recipe '{}' has no pkgconfig section",
            recipe.metadata.name
        )));
    }
    print!("{}", render_pkg_config(&recipe, prefix));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_builder::parse_recipe_str;

    const RECIPE_WITH_DEPS: &str = r#"
metadata:
  name: demo
  version: 1.0.0
  description: Demo artifact
  dependencies:
    build:
      - gperf
      - libtool

source:
  fetch:
    url: "https://example.invalid/demo-1.0.0.tar.gz"
    checksum:
      sha256: "0000000000000000000000000000000000000000000000000000000000000000"

build:
  steps:
    - run: { program: "true" }
"#;

    #[test]
    fn test_check_summary_lists_build_dependencies() {
        let recipe = parse_recipe_str(RECIPE_WITH_DEPS).unwrap();
        let summary = check_summary(&recipe);

        assert_eq!(summary["status"], "ok");
        assert_eq!(summary["name"], "demo");
        assert_eq!(summary["steps"], 1);
        assert_eq!(
            summary["build_dependencies"],
            serde_json::json!(["gperf", "libtool"])
        );
    }
}
