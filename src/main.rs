mod cli;
mod dataset;
mod download;
mod fallback;
mod filter;
mod geo;
mod normalize;
mod pipeline;
mod provider;
mod score;
mod server;
mod sources;
mod storage;
mod tabular;

use anyhow::Context;
use clap::Parser;

use crate::cli::CommonArgs;
use crate::pipeline::{AiSettings, EngineSettings, MatchEngine};
use crate::provider::{MatchConfig, SearchCriteria};
use crate::storage::StoragePaths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Serve(cmd) => {
            let engine = build_engine(&cmd.common).await.context("set up engine")?;
            server::run(cmd, engine).await.context("serve failed")
        }
        cli::Command::Match(cmd) => run_match(cmd).await.context("match failed"),
    }
}

async fn build_engine(common: &CommonArgs) -> anyhow::Result<MatchEngine> {
    let paths = StoragePaths::new(&common.data_dir);

    if let Err(e) = download::ensure_csv(&paths, &common.csv_url, common.offline).await {
        // A missing CSV is not fatal: the provider load chain falls back to
        // the HTTP strategy and then the static directory.
        tracing::warn!("Could not ensure local clinician CSV: {e:#}");
    }

    let ai = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() && !common.offline => Some(AiSettings {
            api_key: key,
            model: common.ai_model.clone(),
        }),
        _ => {
            tracing::info!("Generative AI disabled; keyword symptom analysis only");
            None
        }
    };

    let settings = EngineSettings {
        csv_path: paths.csv_path.clone(),
        csv_url: (!common.offline).then(|| common.csv_url.clone()),
        providers_json: paths.providers_override(),
        specialties_json: paths.specialties_override(),
        ai,
    };
    MatchEngine::new(MatchConfig::default(), settings)
}

async fn run_match(cmd: cli::MatchArgs) -> anyhow::Result<()> {
    let engine = build_engine(&cmd.common).await.context("set up engine")?;

    let criteria = SearchCriteria {
        symptoms: cmd.symptoms,
        location: cmd.location,
        specialty_hint: cmd.specialty,
        condition: cmd.condition,
        insurance: cmd.insurance,
        language: cmd.language,
        telemedicine_preferred: cmd.telemedicine,
        urgency: cmd.urgency.into(),
        origin: None,
    };

    let outcome = engine.find_matching_providers(&criteria).await?;
    tracing::info!(
        "{} match(es) from {} ({:?})",
        outcome.total_matches,
        outcome.provider_source,
        outcome.provider_provenance
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
