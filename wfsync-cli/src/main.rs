//! workflow-sync entry point
//!
//! Compares BMAD workflow definitions with the scenario stories and writes a
//! markdown synchronization report.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use wfsync_core::report::{self, ReportContext};
use wfsync_core::settings::DEFAULT_SETTINGS_FILE;
use wfsync_core::SyncSettings;
use wfsync_llm::{OpenAiCompatibleClient, SyncRunner};
use wfsync_utils::logging::{init_logging, LoggerConfig};
use wfsync_utils::LlmCredentials;

#[derive(Parser, Debug)]
#[command(name = "workflow-sync")]
#[command(about = "Synchronize BMAD workflows with scenario stories")]
#[command(version)]
struct Cli {
    /// Use cached analyses only, never call the completion service
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Analyze a single scenario
    #[arg(short = 's', long)]
    scenario: Option<String>,

    /// Settings file (default: <project-root>/workflow-sync.toml)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Root of the BMAD project
    #[arg(long, default_value = ".")]
    project_root: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LoggerConfig::for_verbosity(cli.verbose)) {
        eprintln!("⚠️  {e}");
    }

    match run(cli).await {
        Ok(report_path) => println!("Report saved to: {}", report_path.display()),
        Err(e) => {
            eprintln!("❌ {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<PathBuf> {
    let project_root = cli.project_root;
    let settings_path = cli
        .config
        .unwrap_or_else(|| project_root.join(DEFAULT_SETTINGS_FILE));
    let settings = SyncSettings::load(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    let mut runner = if cli.dry_run {
        tracing::info!("DRY-RUN mode: cached analyses only, no completion calls");
        SyncRunner::dry_run(settings, &project_root)
    } else {
        let credentials = LlmCredentials::load(&project_root).context("loading LLM configuration")?;
        let client = OpenAiCompatibleClient::new(&credentials, settings.request_timeout())
            .context("building completion client")?;
        SyncRunner::new(settings, &project_root, Arc::new(client))
    };

    if let Some(name) = &cli.scenario {
        runner.select_scenario(name)?;
    }

    let outcome = runner.run().await.context("sync run failed")?;

    let context = ReportContext::new(Local::now(), report::git_commit(runner.project_root()));
    let content = report::render_report(&outcome.results, &outcome.proposals, &context);
    let filename = report::report_filename(&context.generated, runner.is_dry_run());
    let output_dir = runner.project_root().join(&runner.settings().output_dir);
    let report_path = report::write_report(&output_dir, &filename, &content)
        .context("writing report")?;

    tracing::info!("Review the report and implement the suggested changes.");
    Ok(report_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["workflow-sync"]);
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert_eq!(cli.project_root, PathBuf::from("."));
        assert!(cli.scenario.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "workflow-sync",
            "--dry-run",
            "-v",
            "--scenario",
            "quick-flow",
            "--config",
            "custom.toml",
        ]);
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.scenario.as_deref(), Some("quick-flow"));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
