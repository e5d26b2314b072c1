use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use natural_automation::pages::default_registry;
use natural_automation::prelude::*;
use natural_automation::scenario::{ScenarioResult, Story};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "natural-automation")]
#[command(about = "Run natural-language browser scenarios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file (default: $NATURAL_AUTOMATION_CONFIG or natural-automation.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a story file, or every story in a directory
    Run {
        /// Path to a .story file or a directory of them
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// List the pages scenarios can refer to
    Pages,

    /// Parse story files without running them
    Validate {
        /// Path to a .story file or a directory of them
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "natural_automation=debug"
    } else {
        "natural_automation=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "natural-automation failed");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run { path } => run_stories(&path, cli.config.as_deref()).await,
        Commands::Pages => list_pages(),
        Commands::Validate { path } => validate(&path),
    }
}

fn load_stories(path: &Path) -> anyhow::Result<Vec<Story>> {
    if path.is_dir() {
        Ok(StoryLoader::load_directory(path)?)
    } else {
        Ok(vec![StoryLoader::load_file(path)?])
    }
}

async fn run_stories(path: &Path, config: Option<&Path>) -> anyhow::Result<bool> {
    let config = AutomationConfig::discover(config)?;
    let stories = load_stories(path)?;
    let registry = Arc::new(default_registry()?);

    let driver = Arc::new(PlaywrightDriver::launch(&config.playwright).await?);
    let browser = Browser::new(driver.clone()).with_wait_options(config.wait.to_options());

    if let Some(url) = &config.base_url {
        tracing::info!(url = %url, "Opening base URL");
        browser.driver().get(url).await?;
    }

    let runner = StepRunner::new();
    let mut results: Vec<ScenarioResult> = Vec::new();

    for story in &stories {
        println!("\n{}", story.file);
        for scenario in &story.scenarios {
            let mut ctx = ScenarioContext::new(registry.clone(), browser.clone());
            let result = runner.run_scenario(&mut ctx, scenario).await;
            print_result(&result);
            results.push(result);
        }
    }

    if let Err(e) = driver.close().await {
        tracing::warn!(error = %e, "Failed to close browser");
    }

    let passed = results.iter().filter(|r| r.success).count();
    let failed = results.len() - passed;
    println!("\n{} passed, {} failed", passed, failed);

    Ok(failed == 0)
}

fn print_result(result: &ScenarioResult) {
    if result.success {
        println!("  ✓ {} ({} steps)", result.name, result.steps_run);
    } else {
        println!("  ✗ {}", result.name);
        if let Some(error) = &result.error {
            println!("    {}", error);
        }
    }
}

fn list_pages() -> anyhow::Result<bool> {
    let registry = default_registry()?;
    for info in registry.describe() {
        println!("{}", info.name);
        for (field, kind) in &info.fields {
            println!("  {} ({})", field, kind);
        }
        for (action, arity) in &info.actions {
            println!("  {}/{} (action)", action, arity);
        }
    }
    Ok(true)
}

fn validate(path: &Path) -> anyhow::Result<bool> {
    let stories = load_stories(path)?;
    let mut total = 0;
    for story in &stories {
        let steps: usize = story.scenarios.iter().map(|s| s.steps.len()).sum();
        println!(
            "✓ {} ({} scenarios, {} steps)",
            story.file,
            story.scenarios.len(),
            steps
        );
        total += story.scenarios.len();
    }
    println!("\n{} stories, {} scenarios", stories.len(), total);
    Ok(true)
}
