use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use intrinsic_value::ValuationPipeline;
use valuation_core::{FinancialDataProvider, ValuationConfig};
use yahoo_client::{SnapshotProvider, YahooFinanceClient};

mod cli;
mod report;

use cli::{Cli, OutputFormat};

const DEFAULT_LOG_FILTER: &str = "caesar_value=info,intrinsic_value=info,yahoo_client=warn";

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply(ValuationConfig::from_env().context("Invalid CAESAR_* configuration")?);
    tracing::info!(
        method = %config.method,
        growth_rate = config.growth_rate,
        discount_rate = config.discount_rate,
        margin_of_safety = config.margin_of_safety,
        terminal = %config.terminal,
        "Assumptions loaded"
    );

    let provider: Arc<dyn FinancialDataProvider> = match &cli.snapshot {
        Some(path) => Arc::new(SnapshotProvider::new(path.clone())),
        None => Arc::new(YahooFinanceClient::from_env()),
    };

    let pipeline = ValuationPipeline::new(provider, config)?;
    let report = pipeline.evaluate(&cli.ticker).await?;

    match cli.format {
        OutputFormat::Text => print!("{}", report::render_text(&report)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let ticker = cli.ticker.clone();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(ticker = %ticker, error = %err, "Valuation failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
