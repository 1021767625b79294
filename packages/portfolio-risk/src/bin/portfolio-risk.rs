//! Portfolio Risk CLI - command line front end for the risk engine.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_risk::{
    annual_to_daily_rate, AnalysisConfig, AnalysisRequest, ApiResponse, PortfolioAnalysis,
    StaticMarketData, WeightingMode,
};

#[derive(Parser)]
#[command(name = "portfolio-risk")]
#[command(about = "Portfolio risk analysis - VaR, CVaR, Sharpe/Sortino and Monte Carlo projection")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PORTFOLIO_RISK_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full portfolio analysis
    Analyze(AnalyzeArgs),
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Asset tickers
    #[arg(required = true)]
    tickers: Vec<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(short, long)]
    start: String,

    /// End date (YYYY-MM-DD, exclusive)
    #[arg(short, long)]
    end: String,

    /// JSON market data snapshot
    #[arg(short, long)]
    data: PathBuf,

    /// Weighting mode: equal or market-cap
    #[arg(short, long, default_value = "equal")]
    weights: String,

    /// Explicit weight per ticker, in ticker order. Once the weights given
    /// sum to 1 the remaining tickers may be left out and get weight 0.
    #[arg(long = "weight", allow_negative_numbers = true)]
    weight: Vec<f64>,

    /// Confidence level for VaR (0.95 = 95%)
    #[arg(short, long)]
    confidence: Option<f64>,

    /// VaR method: historical or parametric
    #[arg(short, long)]
    method: Option<String>,

    /// Number of Monte Carlo paths
    #[arg(long)]
    simulations: Option<usize>,

    /// Simulation horizon in trading days
    #[arg(long)]
    horizon: Option<usize>,

    /// Target rate for Sharpe/Sortino (daily unless --annual)
    #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
    target_rate: f64,

    /// Interpret --target-rate as an annual rate
    #[arg(long)]
    annual: bool,

    /// Seed for the Monte Carlo simulation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => handle_analyze(cli.config, args).and_then(to_json),
        Commands::Config => handle_config(cli.config),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            let response = ApiResponse::<()>::err(format!("{:#}", e));
            match serde_json::to_string_pretty(&response) {
                Ok(output) => println!("{}", output),
                Err(_) => println!("{{\"ok\":false}}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn to_json<T: Serialize>(data: T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::ok(data))?)
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<(PathBuf, AnalysisConfig)> {
    let path = path.unwrap_or_else(AnalysisConfig::default_path);
    let config = AnalysisConfig::load_from_path(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    Ok((path, config))
}

fn handle_config(path: Option<PathBuf>) -> anyhow::Result<String> {
    let (path, config) = load_config(path)?;
    to_json(json!({
        "path": path,
        "exists": path.exists(),
        "config": config,
    }))
}

fn handle_analyze(
    config_path: Option<PathBuf>,
    args: AnalyzeArgs,
) -> anyhow::Result<portfolio_risk::AnalysisOutput> {
    let (_, mut config) = load_config(config_path)?;

    // Flags override file values
    if let Some(confidence) = args.confidence {
        config.confidence_level = confidence;
    }
    if let Some(method) = args.method {
        config.var_method = method;
    }
    if let Some(simulations) = args.simulations {
        config.num_simulations = simulations;
    }
    if let Some(horizon) = args.horizon {
        config.horizon_days = horizon;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let weighting = if args.weight.is_empty() {
        args.weights.parse::<WeightingMode>()?
    } else {
        WeightingMode::Explicit(args.weight)
    };

    let target_rate = if args.annual {
        annual_to_daily_rate(args.target_rate, config.trading_days_per_year)
    } else {
        args.target_rate
    };

    let tickers: Vec<String> = args
        .tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    let provider = StaticMarketData::load(&args.data)
        .with_context(|| format!("failed to load market data from {}", args.data.display()))?;
    let request = AnalysisRequest::new(tickers, &args.start, &args.end, weighting)?
        .with_target_rate(target_rate);

    Ok(PortfolioAnalysis::new(config).run(&provider, &request)?)
}
