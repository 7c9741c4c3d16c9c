use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use warmbound_funnel::{ConversionRates, EngineConfig, UpliftBaseline};
use warmbound_research::Lookup;
use warmbound_server::batch::{estimate_all, load_companies_file};
use warmbound_server::estimate::{run_estimate, FieldEdit};
use warmbound_server::report;
use warmbound_server::{create_router, AppState, Config};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "warmbound")]
#[command(about = "Revenue and ad-savings estimates for B2B prospects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP research endpoint
    Serve {
        /// Bind address (overrides BIND_ADDRESS)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Research a company and estimate its ROI
    Estimate {
        /// Company domain, e.g. acme.com
        domain: String,

        /// Override one parameter, e.g. --set acv=25000 (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<FieldEdit>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        /// Skip the cache and fetch fresh research
        #[arg(long)]
        refresh: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Estimate every company in a CSV file against default rates
    Batch {
        /// CSV with company, monthly_traffic, acv, tam and optional ad spend columns
        csv: PathBuf,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List every parameter with its default
    Defaults {
        /// Output default conversion rates as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct EngineArgs {
    /// Population the cold-outreach baseline is measured against
    #[arg(long, value_enum, default_value = "warm-subset")]
    baseline: Baseline,

    /// Floor negative Warmbound uplift at zero
    #[arg(long)]
    clamp_uplift: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Baseline {
    /// Warm and cold rates both apply to the warm-account subset
    WarmSubset,
    /// Cold rate applies to the whole market
    FullMarket,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            uplift_baseline: match self.baseline {
                Baseline::WarmSubset => UpliftBaseline::WarmSubset,
                Baseline::FullMarket => UpliftBaseline::FullMarket,
            },
            clamp_negative_uplift: self.clamp_uplift,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Estimate {
            domain,
            set,
            json,
            refresh,
            engine,
        } => estimate(config, &domain, &set, json, refresh, engine.config()).await,
        Commands::Batch { csv, json, engine } => batch(&csv, json, engine.config()),
        Commands::Defaults { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ConversionRates::default())?);
            } else {
                println!("{}", report::render_defaults());
            }
            Ok(())
        }
    }
}

async fn serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let bind_addr = bind.unwrap_or_else(|| config.bind_address.clone());
    if config.research_api_key.is_none() {
        log::warn!("RESEARCH_API_KEY is not set; research requests will fail until it is");
    }

    let provider = config
        .upstream_provider()
        .context("Failed to build research provider")?;
    let app = create_router(AppState::new(provider));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    log::info!("Warmbound research endpoint listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn estimate(
    config: Config,
    domain: &str,
    edits: &[FieldEdit],
    json: bool,
    refresh: bool,
    engine: EngineConfig,
) -> anyhow::Result<()> {
    let provider = config
        .cli_provider()
        .context("Failed to build research provider")?;
    let cache = Arc::new(config.research_cache());
    log::debug!("research cache at {}", cache.path().display());

    let lookup = Lookup::new(cache, provider);
    let estimate = run_estimate(&lookup, domain, edits, refresh, engine).await?;

    if json {
        let body = report::build_estimate_json(&estimate)?;
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", report::render_estimate(&estimate)?);
    }
    Ok(())
}

fn batch(path: &std::path::Path, json: bool, engine: EngineConfig) -> anyhow::Result<()> {
    let start = Instant::now();
    let rows = load_companies_file(path)?;
    let estimates = estimate_all(&rows, &engine);
    log::info!(
        "estimated {} companies in {}ms",
        estimates.len(),
        start.elapsed().as_millis()
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report::build_batch_json(&estimates))?
        );
    } else {
        println!("{}", report::render_batch(&estimates));
    }
    Ok(())
}
