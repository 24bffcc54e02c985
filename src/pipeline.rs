use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::dataset;
use crate::fallback::{MinIntervalGate, Orchestrator, Sourced};
use crate::filter::{self, SpecialtyTable};
use crate::geo::{self, TravelMode};
use crate::provider::{
    Confidence, MatchConfig, Provenance, ProviderRecord, ScoredCandidate, SearchCriteria,
    SymptomAnalysis,
};
use crate::score;
use crate::sources::{
    GenerativeAnalysis, GeocodedLocation, NominatimGeocode, ProviderCsvFile, ProviderCsvHttp,
    USER_AGENT,
};

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: String,
    pub model: String,
}

/// Where the engine finds its inputs. Paths are optional overrides; the
/// built-in datasets apply when unset.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub csv_path: PathBuf,
    pub csv_url: Option<String>,
    pub providers_json: Option<PathBuf>,
    pub specialties_json: Option<PathBuf>,
    pub ai: Option<AiSettings>,
}

/// Ranked result of one pipeline run, with provenance for every derived
/// part so the caller can tell real data from fallback data.
#[derive(Debug, Serialize)]
pub struct MatchOutcome {
    pub matches: Vec<ScoredCandidate>,
    pub total_matches: usize,
    pub analysis: SymptomAnalysis,
    pub analysis_source: String,
    pub provider_source: String,
    pub provider_provenance: Provenance,
}

/// The provider matching pipeline: load, normalize, filter, score, rank.
/// Explicitly constructed and passed around; holds no global state.
pub struct MatchEngine {
    config: MatchConfig,
    settings: EngineSettings,
    specialties: SpecialtyTable,
    fallback_providers: Vec<ProviderRecord>,
    client: reqwest::Client,
    ai_gate: Arc<MinIntervalGate>,
}

impl MatchEngine {
    pub fn new(config: MatchConfig, settings: EngineSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;

        let specialties = match &settings.specialties_json {
            Some(path) => SpecialtyTable::from_json_file(path)?,
            None => SpecialtyTable::builtin(),
        };
        let fallback_providers = match &settings.providers_json {
            Some(path) => dataset::load_providers(path)?,
            None => dataset::builtin_providers()?,
        };

        let ai_gate = Arc::new(MinIntervalGate::new(config.ai_min_interval));
        Ok(Self {
            config,
            settings,
            specialties,
            fallback_providers,
            client,
            ai_gate,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn specialty_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .specialties
            .rules
            .iter()
            .map(|r| r.specialty.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn fallback_provider_count(&self) -> usize {
        self.fallback_providers.len()
    }

    /// Runs the whole pipeline for one set of criteria. Never fails on
    /// source trouble: every external chain bottoms out in static data.
    pub async fn find_matching_providers(
        &self,
        criteria: &SearchCriteria,
    ) -> anyhow::Result<MatchOutcome> {
        let analysis = self.analyze(criteria).await;
        let providers = self.load_providers().await;

        let candidates = filter::filter(providers.value, criteria, &self.specialties);
        let scoring_analysis = scoring_context(criteria, &analysis.value);
        let mut scored = score::score(candidates, criteria, &scoring_analysis, &self.config);

        let total_matches = scored.len();
        scored.truncate(self.config.top_n);
        if let Some(origin) = criteria.origin {
            enrich_distances(&mut scored, origin);
        }

        Ok(MatchOutcome {
            matches: scored,
            total_matches,
            analysis: analysis.value,
            analysis_source: analysis.strategy,
            provider_source: providers.strategy,
            provider_provenance: providers.provenance,
        })
    }

    /// Symptom analysis chain: generative AI first (debounced), keyword
    /// table last. A caller-supplied specialty hint with no symptom text
    /// skips the chain entirely.
    pub async fn analyze(&self, criteria: &SearchCriteria) -> Sourced<SymptomAnalysis> {
        let symptoms = criteria.symptoms.trim();
        if symptoms.is_empty() {
            if let Some(hint) = criteria
                .specialty_hint
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                return Sourced {
                    value: SymptomAnalysis {
                        primary_specialty: hint.to_string(),
                        secondary_specialties: Vec::new(),
                        confidence: Confidence::High,
                        reasoning: "Specialty provided by the caller".to_string(),
                        urgency: criteria.urgency,
                    },
                    strategy: "specialty-hint".to_string(),
                    provenance: Provenance::StaticFallback,
                };
            }
            return Sourced::fallback(self.specialties.analyze(symptoms));
        }

        let mut orch = Orchestrator::new("symptom-analysis", self.config.request_timeout)
            .with_gate(self.ai_gate.clone());
        if let Some(ai) = &self.settings.ai {
            orch = orch.push(Box::new(GenerativeAnalysis {
                client: self.client.clone(),
                api_key: ai.api_key.clone(),
                model: ai.model.clone(),
                symptoms: symptoms.to_string(),
            }));
        }
        orch.fetch(|| self.specialties.analyze(symptoms)).await
    }

    /// Provider load chain: local CSV, then the government download, then
    /// the static directory.
    async fn load_providers(&self) -> Sourced<Vec<ProviderRecord>> {
        let mut orch =
            Orchestrator::new("provider-load", self.config.request_timeout).push(Box::new(
                ProviderCsvFile {
                    path: self.settings.csv_path.clone(),
                    max_rows: self.config.max_rows,
                    min_columns: self.config.min_columns,
                },
            ));
        if let Some(url) = &self.settings.csv_url {
            orch = orch.push(Box::new(ProviderCsvHttp {
                client: self.client.clone(),
                url: url.clone(),
                max_rows: self.config.max_rows,
                min_columns: self.config.min_columns,
            }));
        }
        orch.fetch(|| self.fallback_providers.clone()).await
    }

    /// Geocoding chain: Nominatim, then the static city table.
    pub async fn geocode(&self, query: &str) -> Sourced<GeocodedLocation> {
        let orch = Orchestrator::new("geocode", self.config.request_timeout).push(Box::new(
            NominatimGeocode {
                client: self.client.clone(),
                query: query.to_string(),
            },
        ));
        let query = query.to_string();
        orch.fetch(move || {
            let (coordinates, display_name) = dataset::fallback_coordinates(&query);
            GeocodedLocation {
                coordinates,
                display_name,
            }
        })
        .await
    }
}

/// A caller-supplied specialty hint outranks whatever the analysis chain
/// inferred; the inferred primary is demoted to a secondary.
fn scoring_context(criteria: &SearchCriteria, analysis: &SymptomAnalysis) -> SymptomAnalysis {
    let Some(hint) = criteria
        .specialty_hint
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return analysis.clone();
    };
    let mut ctx = analysis.clone();
    if !ctx.primary_specialty.eq_ignore_ascii_case(hint) {
        let demoted = std::mem::replace(&mut ctx.primary_specialty, hint.to_string());
        if !demoted.is_empty() && !ctx.secondary_specialties.contains(&demoted) {
            ctx.secondary_specialties.insert(0, demoted);
        }
    }
    ctx
}

/// Display enrichment only: attaches distance and a driving-time estimate
/// to candidates that have coordinates. Never reorders the list.
fn enrich_distances(candidates: &mut [ScoredCandidate], origin: crate::geo::LatLng) {
    for c in candidates.iter_mut() {
        if let Some(coords) = c.provider.coordinates {
            let distance = geo::haversine_distance(origin, coords);
            c.travel_time_minutes =
                Some(geo::estimate_travel_time(distance.km, TravelMode::Driving).minutes);
            c.distance = Some(distance);
        }
    }
}
