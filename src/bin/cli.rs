//! javaview CLI - structure graphs for Java projects.
//!
//! Usage:
//!   javaview view -p shapes -c Circle -m area     # Graph for one method
//!   javaview view -p app -c Main -m main -f json  # JSON output on stdout
//!   javaview projects                             # Projects and source packages

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use javaview::cli::{render_outcome, render_project, resolve_scope, Cli, Commands, OutputFormat};
use javaview::{build_view_graph, FsWorkspace, GraphViewConfig, ProjectSource, Workspace};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let config_path = cli
        .config
        .unwrap_or_else(|| GraphViewConfig::default_path(&root));
    let config = GraphViewConfig::load(&config_path);
    debug!(root = %root.display(), config = %config_path.display(), "configuration loaded");

    match cli.command {
        Commands::View {
            package,
            class,
            method,
            format,
        } => {
            let Some(scope) = resolve_scope(config.scope.as_ref(), package, class, method) else {
                bail!("no target method: pass --class and --method or set [scope] in the config");
            };
            let outcome = build_view_graph(&root, &scope, &config)
                .with_context(|| format!("failed to build view graph for {scope}"))?;

            match format {
                OutputFormat::Text => print!("{}", render_outcome(&scope, &outcome)),
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "scope": scope,
                        "graph": outcome.registry.snapshot(),
                        "diagnostics": outcome.diagnostics,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }
        }

        Commands::Projects => {
            let workspace = FsWorkspace::new(&root, config.workspace.clone());
            let projects = workspace
                .projects()
                .with_context(|| format!("failed to list projects under {}", root.display()))?;
            if projects.is_empty() {
                println!("No projects found under {}", root.display());
            }
            for project in &projects {
                let fragments = project.package_fragments().unwrap_or_else(|e| {
                    eprintln!("  {}: {}", project.name(), e);
                    Vec::new()
                });
                print!(
                    "{}",
                    render_project(project, &config.workspace.java_nature, &fragments)
                );
            }
        }
    }

    Ok(())
}
