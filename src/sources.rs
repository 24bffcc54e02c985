use std::path::PathBuf;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::fallback::FetchStrategy;
use crate::geo::LatLng;
use crate::normalize;
use crate::provider::{ProviderRecord, Provenance, SymptomAnalysis};
use crate::tabular;

pub const USER_AGENT: &str = "MediConnect/1.0 (provider matching backend)";

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const GENERATIVE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Parse + normalize one CSV payload into provider records. Shared by the
/// disk and HTTP strategies and by the end-to-end tests.
pub fn providers_from_text(
    text: &str,
    max_rows: usize,
    min_columns: usize,
) -> anyhow::Result<Vec<ProviderRecord>> {
    let rows = tabular::parse(text, max_rows, min_columns)?;
    Ok(rows.iter().filter_map(normalize::normalize).collect())
}

/// CMS clinician CSV already present on disk.
pub struct ProviderCsvFile {
    pub path: PathBuf,
    pub max_rows: usize,
    pub min_columns: usize,
}

#[async_trait]
impl FetchStrategy<Vec<ProviderRecord>> for ProviderCsvFile {
    fn name(&self) -> &str {
        "csv-file"
    }

    fn provenance(&self) -> Provenance {
        Provenance::CsvGovernment
    }

    async fn attempt(&self) -> anyhow::Result<Vec<ProviderRecord>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        let records = providers_from_text(&text, self.max_rows, self.min_columns)?;
        if records.is_empty() {
            return Err(anyhow!("no valid provider rows in {}", self.path.display()));
        }
        Ok(records)
    }
}

/// Same extract fetched over HTTP, for when the local copy is missing or
/// stale.
pub struct ProviderCsvHttp {
    pub client: reqwest::Client,
    pub url: String,
    pub max_rows: usize,
    pub min_columns: usize,
}

#[async_trait]
impl FetchStrategy<Vec<ProviderRecord>> for ProviderCsvHttp {
    fn name(&self) -> &str {
        "csv-download"
    }

    fn provenance(&self) -> Provenance {
        Provenance::CsvGovernment
    }

    async fn attempt(&self) -> anyhow::Result<Vec<ProviderRecord>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        if !resp.status().is_success() {
            return Err(anyhow!("CSV download failed ({}): {}", resp.status(), self.url));
        }
        let text = resp.text().await.context("read CSV body")?;
        let records = providers_from_text(&text, self.max_rows, self.min_columns)?;
        if records.is_empty() {
            return Err(anyhow!("no valid provider rows from {}", self.url));
        }
        Ok(records)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeocodedLocation {
    pub coordinates: LatLng,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
    display_name: String,
}

/// Free OpenStreetMap geocoding. Nominatim asks for an identifying
/// User-Agent, so the shared client must be built with one.
pub struct NominatimGeocode {
    pub client: reqwest::Client,
    pub query: String,
}

#[async_trait]
impl FetchStrategy<GeocodedLocation> for NominatimGeocode {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn attempt(&self) -> anyhow::Result<GeocodedLocation> {
        let resp = self
            .client
            .get(NOMINATIM_SEARCH_URL)
            .query(&[("format", "json"), ("q", self.query.as_str()), ("limit", "1")])
            .header("Accept-Language", "en")
            .send()
            .await
            .context("GET nominatim search")?;
        if !resp.status().is_success() {
            return Err(anyhow!("geocoding failed: {}", resp.status()));
        }
        let hits: Vec<NominatimHit> = resp.json().await.context("parse nominatim response")?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("location not found: {}", self.query))?;
        Ok(GeocodedLocation {
            coordinates: LatLng {
                lat: hit.lat.parse().context("parse lat")?,
                lng: hit.lon.parse().context("parse lon")?,
            },
            display_name: hit.display_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<ContentPart>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ContentPart {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Generative-AI symptom analysis: asks the chat completion endpoint for a
/// JSON specialty recommendation. Anything short of valid JSON in the reply
/// is a strategy failure; the keyword table takes over downstream.
pub struct GenerativeAnalysis {
    pub client: reqwest::Client,
    pub api_key: String,
    pub model: String,
    pub symptoms: String,
}

impl GenerativeAnalysis {
    fn prompt(&self) -> String {
        format!(
            "As a medical specialist matching assistant, analyze the patient's \
             symptoms and recommend appropriate medical specialties.\n\n\
             Patient symptoms: {}\n\n\
             Respond with JSON only, no prose, in this exact shape:\n\
             {{\n  \"primarySpecialty\": \"specialty name\",\n  \
             \"secondarySpecialties\": [\"specialty1\", \"specialty2\"],\n  \
             \"confidence\": \"high|medium|low\",\n  \
             \"reasoning\": \"one sentence\",\n  \
             \"urgency\": \"routine|urgent|emergency\"\n}}",
            self.symptoms
        )
    }
}

#[async_trait]
impl FetchStrategy<SymptomAnalysis> for GenerativeAnalysis {
    fn name(&self) -> &str {
        "generative-ai"
    }

    async fn attempt(&self) -> anyhow::Result<SymptomAnalysis> {
        let url = format!(
            "{GENERATIVE_API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![ContentPart {
                parts: vec![TextPart {
                    text: self.prompt(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 1024,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("POST generateContent")?;
        if !resp.status().is_success() {
            return Err(anyhow!("AI request failed: {}", resp.status()));
        }
        let parsed: GenerateContentResponse =
            resp.json().await.context("parse generateContent response")?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("AI response had no text candidates"))?;

        let json = strip_code_fences(text);
        serde_json::from_str(json).context("parse AI specialty analysis JSON")
    }
}

/// Models often wrap JSON replies in markdown fences despite instructions.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
