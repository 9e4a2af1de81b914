//! CLI for analyzing a single URL without running the server
//!
//! Runs the same pipeline as `POST /analyze` in-process and prints the
//! response envelope as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use pain_hunter_core::config::Config;
use pain_hunter_core::domains::analysis::{
    AnalysisRequest, AnalysisResponse, Pipeline, PipelineError,
};
use pain_hunter_core::kernel::ServerDeps;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hunt")]
#[command(about = "Find the recurring complaints and emotional hooks on a product page")]
struct Cli {
    /// Product or review page to analyze
    url: String,

    /// Platform label stored with the analysis
    #[arg(long, default_value = "amazon")]
    platform: String,

    /// Don't persist the result even if a database is configured
    #[arg(long)]
    no_store: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pain_hunter_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = ServerDeps::from_config(&config)
        .await
        .context("Failed to initialize dependencies")?;

    let mut pipeline = Pipeline::from_deps(&deps);
    if cli.no_store {
        pipeline = pipeline.without_store();
    }

    let request = AnalysisRequest::new(cli.url).with_platform(cli.platform);
    tracing::info!(url = %request.url, persist = pipeline.has_store(), "Hunting");

    match pipeline.run(&request).await {
        Ok(outcome) => {
            let response = AnalysisResponse::success(outcome.analysis_id(), outcome.report);
            println!(
                "{}",
                serde_json::to_string_pretty(&response).context("Failed to encode result")?
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ PipelineError::ExtractionFailed) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e).context("Analysis failed"),
    }
}
