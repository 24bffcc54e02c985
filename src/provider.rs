use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::{Distance, LatLng};

/// Which source/strategy a record or payload came from. Surfaced to callers
/// so the UI can distinguish real data from canned fallback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    CsvGovernment,
    ExternalApi,
    StaticFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One clinician or facility eligible for matching.
///
/// `rating`, `experience_years`, `conditions`, `languages` and the other
/// enrichment fields are only populated by sources that carry them (the
/// static directory dataset); records normalized from the government CSV
/// leave them unset, and scoring rules that depend on them simply do not
/// fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub credentials: Option<String>,

    pub primary_specialty: String,
    #[serde(default)]
    pub secondary_specialty: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub coordinates: Option<LatLng>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub insurance: Vec<String>,
    #[serde(default)]
    pub telemedicine: bool,
    /// Days until the next open appointment slot, when known.
    #[serde(default)]
    pub availability_days: Option<u32>,

    pub source: Provenance,
    #[serde(default)]
    pub is_verified_real: bool,
}

/// Public input to the matching pipeline, independent of any UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub specialty_hint: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub insurance: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub telemedicine_preferred: bool,
    #[serde(default)]
    pub urgency: Urgency,
    /// Caller's coordinates; enables distance/travel-time enrichment of the
    /// results. Never affects filtering or rank.
    #[serde(default)]
    pub origin: Option<LatLng>,
}

/// A provider plus its match score. Immutable once created; consumers only
/// reorder or slice the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub provider: ProviderRecord,
    pub match_score: i32,
    pub match_percentage: u8,
    pub scoring_factors: Vec<String>,
    #[serde(default)]
    pub distance: Option<Distance>,
    #[serde(default)]
    pub travel_time_minutes: Option<u32>,
}

/// Specialty recommendation derived from free-text symptoms, either by the
/// generative-AI chain or the static keyword table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAnalysis {
    pub primary_specialty: String,
    #[serde(default)]
    pub secondary_specialties: Vec<String>,
    pub confidence: Confidence,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub urgency: Urgency,
}

/// Policy constants for the pipeline. The defaults are the reference values;
/// all of them are tunable.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Rows accepted from one CSV payload before the rest is ignored.
    pub max_rows: usize,
    /// Minimum tokenized column count for a row to be usable.
    pub min_columns: usize,
    /// Denominator for the 0-100 match percentage; the maximum plausible
    /// additive score, not a hard cap.
    pub max_plausible_score: i32,
    /// Matches returned to the caller.
    pub top_n: usize,
    /// Per-strategy timeout for external calls.
    pub request_timeout: Duration,
    /// Minimum interval between generative-AI requests; calls inside the
    /// window go straight to the fallback analysis.
    pub ai_min_interval: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            min_columns: 29,
            max_plausible_score: 110,
            top_n: 5,
            request_timeout: Duration::from_secs(8),
            ai_min_interval: Duration::from_millis(1000),
        }
    }
}
