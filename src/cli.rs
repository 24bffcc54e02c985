use clap::{Parser, Subcommand};

use crate::provider::Urgency;

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Parser, Debug)]
#[command(name = "mediconnect-backend")]
#[command(about = "MediConnect provider matching backend", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the matching HTTP API.
    Serve(ServeArgs),
    /// Run one match against the local data and print ranked candidates.
    Match(MatchArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Backend data directory (CSV download, dataset overrides).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Source URL for the CMS clinician CSV.
    #[arg(long, default_value = crate::download::DEFAULT_CSV_URL)]
    pub csv_url: String,

    /// Never touch the network; error if the CSV is missing and rely on
    /// static fallbacks for everything else.
    #[arg(long)]
    pub offline: bool,

    /// Generative model used for symptom analysis (requires GEMINI_API_KEY
    /// in the environment; keyword fallback applies otherwise).
    #[arg(long, default_value = "gemini-1.5-flash")]
    pub ai_model: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Free-text symptoms.
    #[arg(long, default_value = "")]
    pub symptoms: String,

    /// Free-text location, e.g. "Fairfax, VA".
    #[arg(long)]
    pub location: Option<String>,

    /// Requested specialty; skips symptom analysis when symptoms are empty.
    #[arg(long)]
    pub specialty: Option<String>,

    /// Known condition for the condition-expertise scoring rule.
    #[arg(long)]
    pub condition: Option<String>,

    /// Insurance plan to filter against providers with a known plan list.
    #[arg(long)]
    pub insurance: Option<String>,

    /// Preferred language.
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub telemedicine: bool,

    #[arg(long, value_enum, default_value_t = UrgencyArg::Routine)]
    pub urgency: UrgencyArg,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyArg {
    Routine,
    Urgent,
    Emergency,
}

impl From<UrgencyArg> for Urgency {
    fn from(v: UrgencyArg) -> Self {
        match v {
            UrgencyArg::Routine => Urgency::Routine,
            UrgencyArg::Urgent => Urgency::Urgent,
            UrgencyArg::Emergency => Urgency::Emergency,
        }
    }
}
