use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::provider::{Confidence, ProviderRecord, SearchCriteria, SymptomAnalysis, Urgency};

/// One symptom-keyword to specialty mapping. The table is data, not logic:
/// it can be replaced wholesale by loading a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyRule {
    pub keywords: Vec<String>,
    pub specialty: String,
    #[serde(default)]
    pub secondary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyTable {
    pub rules: Vec<SpecialtyRule>,
}

impl SpecialtyTable {
    /// Reference table distilled from the symptom keywords the matching
    /// heuristic has always used. Extend by editing the JSON override, not
    /// this list.
    pub fn builtin() -> Self {
        fn rule(keywords: &[&str], specialty: &str, secondary: &[&str]) -> SpecialtyRule {
            SpecialtyRule {
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
                specialty: specialty.to_string(),
                secondary: secondary.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            rules: vec![
                rule(
                    &["chest", "heart", "palpitation"],
                    "Cardiology",
                    &["General Medicine", "Emergency Medicine"],
                ),
                rule(&["tooth", "dental", "gum"], "Dentistry", &["Pediatrics"]),
                rule(
                    &["headache", "migraine", "seizure", "neuro"],
                    "Neurology",
                    &["General Medicine"],
                ),
                rule(&["skin", "rash", "acne", "mole"], "Dermatology", &[]),
                rule(
                    &["stomach", "abdominal", "nausea", "liver"],
                    "Gastroenterology",
                    &["General Medicine"],
                ),
                rule(
                    &["throat", "ear", "nose", "sinus"],
                    "ENT",
                    &["Internal Medicine", "Family Medicine"],
                ),
                rule(
                    &["joint", "knee", "shoulder", "fracture", "bone"],
                    "Orthopedics",
                    &["Sports Medicine"],
                ),
                rule(
                    &["anxiety", "depression", "insomnia"],
                    "Psychiatry",
                    &["General Medicine"],
                ),
                rule(
                    &["cough", "breath", "lung", "wheez"],
                    "Pulmonology",
                    &["General Medicine"],
                ),
                rule(&["child", "pediatric", "infant"], "Pediatrics", &[]),
            ],
        }
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read specialty table {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse specialty table {}", path.display()))
    }

    /// Specialty terms whose keywords appear in the symptom text.
    pub fn infer_specialties(&self, symptoms: &str) -> Vec<String> {
        let text = symptoms.to_lowercase();
        let mut out = Vec::new();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| text.contains(k.as_str()))
                && !out.contains(&rule.specialty)
            {
                out.push(rule.specialty.clone());
            }
        }
        out
    }

    /// Keyword-only stand-in for the AI symptom analysis. Always succeeds;
    /// used as the terminal layer of the analysis fallback chain.
    pub fn analyze(&self, symptoms: &str) -> SymptomAnalysis {
        let text = symptoms.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| text.contains(k.as_str())) {
                let urgency = if rule.specialty == "Cardiology" && text.contains("pain") {
                    Urgency::Urgent
                } else {
                    Urgency::Routine
                };
                return SymptomAnalysis {
                    primary_specialty: rule.specialty.clone(),
                    secondary_specialties: rule.secondary.clone(),
                    confidence: Confidence::Medium,
                    reasoning: "Matched symptom keywords against the static specialty table"
                        .to_string(),
                    urgency,
                };
            }
        }
        SymptomAnalysis {
            primary_specialty: "General Medicine".to_string(),
            secondary_specialties: Vec::new(),
            confidence: Confidence::Low,
            reasoning: "No specialty keywords recognized; starting with primary care".to_string(),
            urgency: Urgency::Routine,
        }
    }
}

/// Narrows the normalized set by specialty terms and location, then by the
/// insurance and language preferences where the provider data carries them.
/// Returns an empty vector when nothing survives; deciding whether to fall
/// back is the caller's job.
pub fn filter(
    records: Vec<ProviderRecord>,
    criteria: &SearchCriteria,
    table: &SpecialtyTable,
) -> Vec<ProviderRecord> {
    let mut terms: Vec<String> = Vec::new();
    if let Some(hint) = criteria
        .specialty_hint
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        terms.push(hint.to_string());
    }
    for t in table.infer_specialties(&criteria.symptoms) {
        if !terms.contains(&t) {
            terms.push(t);
        }
    }

    records
        .into_iter()
        .filter(|r| specialty_matches(r, &terms))
        .filter(|r| {
            criteria
                .location
                .as_deref()
                .map(|loc| location_matches(r, loc))
                .unwrap_or(true)
        })
        .filter(|r| insurance_matches(r, criteria.insurance.as_deref()))
        .filter(|r| language_matches(r, criteria.language.as_deref()))
        .collect()
}

fn specialty_matches(record: &ProviderRecord, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let primary = record.primary_specialty.to_lowercase();
    let secondary = record
        .secondary_specialty
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    terms.iter().any(|t| {
        let t = t.to_lowercase();
        primary.contains(&t) || (!secondary.is_empty() && secondary.contains(&t))
    })
}

/// Case-insensitive equality against the comma-separated parts of the
/// requested location ("Fairfax, VA" matches state VA or city Fairfax).
/// Geodistance is deliberately not consulted here; it only enriches ranked
/// output later.
pub fn location_matches(record: &ProviderRecord, location: &str) -> bool {
    let city = record.city.to_lowercase();
    let state = record.state.to_lowercase();
    let loc = location.to_lowercase();
    if !city.is_empty() && loc == city {
        return true;
    }
    loc.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|p| p == state || (!city.is_empty() && p == city))
}

/// State component of a free-text location, for the same-state scoring rule.
pub fn state_matches(record: &ProviderRecord, location: &str) -> bool {
    let state = record.state.to_lowercase();
    if state.is_empty() {
        return false;
    }
    location
        .to_lowercase()
        .split(',')
        .map(str::trim)
        .any(|p| p == state)
}

fn insurance_matches(record: &ProviderRecord, insurance: Option<&str>) -> bool {
    let Some(wanted) = insurance.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    // An empty accepted-insurers list means the data is unknown, not that
    // the provider rejects the plan.
    if record.insurance.is_empty() {
        return true;
    }
    record
        .insurance
        .iter()
        .any(|i| i.eq_ignore_ascii_case(wanted))
}

fn language_matches(record: &ProviderRecord, language: Option<&str>) -> bool {
    let Some(wanted) = language.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    // Same leniency as insurance: no language data is not a mismatch.
    if record.languages.is_empty() {
        return true;
    }
    record
        .languages
        .iter()
        .any(|l| l.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provenance;

    fn record(name: &str, specialty: &str, city: &str, state: &str) -> ProviderRecord {
        ProviderRecord {
            id: format!("t-{name}"),
            name: name.to_string(),
            credentials: None,
            primary_specialty: specialty.to_string(),
            secondary_specialty: None,
            address: None,
            city: city.to_string(),
            state: state.to_string(),
            postal_code: None,
            coordinates: None,
            phone: None,
            rating: None,
            experience_years: None,
            conditions: Vec::new(),
            languages: Vec::new(),
            insurance: Vec::new(),
            telemedicine: false,
            availability_days: None,
            source: Provenance::CsvGovernment,
            is_verified_real: true,
        }
    }

    #[test]
    fn specialty_hint_narrows_the_set() {
        let records = vec![
            record("A", "Cardiology", "Richmond", "VA"),
            record("B", "Dermatology", "Richmond", "VA"),
        ];
        let criteria = SearchCriteria {
            specialty_hint: Some("Cardiology".to_string()),
            ..Default::default()
        };
        let kept = filter(records, &criteria, &SpecialtyTable::builtin());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "A");
    }

    #[test]
    fn symptoms_infer_specialty_terms() {
        let records = vec![
            record("A", "Cardiology", "Richmond", "VA"),
            record("B", "Dermatology", "Richmond", "VA"),
        ];
        let criteria = SearchCriteria {
            symptoms: "chest pain when climbing stairs".to_string(),
            ..Default::default()
        };
        let kept = filter(records, &criteria, &SpecialtyTable::builtin());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].primary_specialty, "Cardiology");
    }

    #[test]
    fn location_matches_state_part() {
        let rec = record("A", "Cardiology", "Fairfax", "VA");
        assert!(location_matches(&rec, "Fairfax, VA"));
        assert!(location_matches(&rec, "VA"));
        assert!(location_matches(&rec, "fairfax"));
        assert!(!location_matches(&rec, "New York, NY"));
    }

    #[test]
    fn unknown_insurance_list_is_not_a_rejection() {
        let mut with_list = record("A", "Cardiology", "Richmond", "VA");
        with_list.insurance = vec!["Aetna".to_string()];
        let without_list = record("B", "Cardiology", "Richmond", "VA");

        let criteria = SearchCriteria {
            specialty_hint: Some("Cardiology".to_string()),
            insurance: Some("Blue Cross".to_string()),
            ..Default::default()
        };
        let kept = filter(
            vec![with_list, without_list],
            &criteria,
            &SpecialtyTable::builtin(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "B");
    }

    #[test]
    fn language_preference_is_a_hard_filter_when_known() {
        let mut spanish = record("A", "Cardiology", "Richmond", "VA");
        spanish.languages = vec!["English".to_string(), "Spanish".to_string()];
        let mut english_only = record("B", "Cardiology", "Richmond", "VA");
        english_only.languages = vec!["English".to_string()];
        let unknown = record("C", "Cardiology", "Richmond", "VA");

        let criteria = SearchCriteria {
            specialty_hint: Some("Cardiology".to_string()),
            language: Some("Spanish".to_string()),
            ..Default::default()
        };
        let kept = filter(
            vec![spanish, english_only, unknown],
            &criteria,
            &SpecialtyTable::builtin(),
        );
        let names: Vec<_> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn keyword_analysis_maps_known_symptoms() {
        let table = SpecialtyTable::builtin();

        let chest = table.analyze("crushing chest pain");
        assert_eq!(chest.primary_specialty, "Cardiology");
        assert_eq!(chest.urgency, Urgency::Urgent);
        assert_eq!(chest.confidence, Confidence::Medium);

        let tooth = table.analyze("my tooth hurts");
        assert_eq!(tooth.primary_specialty, "Dentistry");

        let vague = table.analyze("feeling generally unwell");
        assert_eq!(vague.primary_specialty, "General Medicine");
        assert_eq!(vague.confidence, Confidence::Low);
    }

    #[test]
    fn empty_criteria_keep_everything() {
        let records = vec![
            record("A", "Cardiology", "Richmond", "VA"),
            record("B", "Dermatology", "Albany", "NY"),
        ];
        let kept = filter(records, &SearchCriteria::default(), &SpecialtyTable::builtin());
        assert_eq!(kept.len(), 2);
    }
}
