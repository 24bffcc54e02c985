use crate::filter::state_matches;
use crate::provider::{
    MatchConfig, ProviderRecord, ScoredCandidate, SearchCriteria, SymptomAnalysis, Urgency,
};

/// Reference weights for the additive rule set. Tunable, but every rule must
/// stay independent of the others: no rule may look at another rule's
/// outcome, only at the provider and the criteria.
mod weights {
    pub const PRIMARY_SPECIALTY: i32 = 30;
    pub const SECONDARY_SPECIALTY: i32 = 20;
    pub const EXPERIENCE_HIGH: i32 = 15;
    pub const EXPERIENCE_GOOD: i32 = 10;
    pub const EXPERIENCE_BASE: i32 = 5;
    pub const RATING_EXCELLENT: i32 = 15;
    pub const RATING_GOOD: i32 = 10;
    pub const RATING_BASE: i32 = 5;
    pub const CONDITION_MATCH: i32 = 20;
    pub const URGENT_AVAILABILITY: i32 = 10;
    pub const SAME_STATE: i32 = 8;
    pub const LANGUAGE: i32 = 7;
    pub const TELEMEDICINE: i32 = 5;
}

/// Scores and ranks candidates. Sorted by score descending, ties broken by
/// rating descending then name ascending. An empty input yields an empty
/// output, never an error.
pub fn score(
    records: Vec<ProviderRecord>,
    criteria: &SearchCriteria,
    analysis: &SymptomAnalysis,
    config: &MatchConfig,
) -> Vec<ScoredCandidate> {
    let mut out: Vec<ScoredCandidate> = records
        .into_iter()
        .map(|r| score_one(r, criteria, analysis, config))
        .collect();

    out.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| rating_of(b).total_cmp(&rating_of(a)))
            .then_with(|| a.provider.name.cmp(&b.provider.name))
    });
    out
}

fn rating_of(c: &ScoredCandidate) -> f64 {
    c.provider.rating.unwrap_or(0.0)
}

fn score_one(
    provider: ProviderRecord,
    criteria: &SearchCriteria,
    analysis: &SymptomAnalysis,
    config: &MatchConfig,
) -> ScoredCandidate {
    let mut score = 0;
    let mut factors = Vec::new();
    let mut add = |points: i32, factor: String| {
        score += points;
        factors.push(factor);
    };

    let primary = provider.primary_specialty.as_str();
    if primary.eq_ignore_ascii_case(&analysis.primary_specialty) {
        add(
            weights::PRIMARY_SPECIALTY,
            format!("Primary specialty match: +{}", weights::PRIMARY_SPECIALTY),
        );
    } else if analysis
        .secondary_specialties
        .iter()
        .any(|s| s.eq_ignore_ascii_case(primary))
        || provider
            .secondary_specialty
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(&analysis.primary_specialty))
    {
        add(
            weights::SECONDARY_SPECIALTY,
            format!("Secondary specialty match: +{}", weights::SECONDARY_SPECIALTY),
        );
    }

    // Experience and rating tiers are mutually exclusive within each rule
    // and fire only when the source carried the field at all.
    if let Some(years) = provider.experience_years {
        if years > 15 {
            add(
                weights::EXPERIENCE_HIGH,
                format!("High experience (>15 years): +{}", weights::EXPERIENCE_HIGH),
            );
        } else if years > 10 {
            add(
                weights::EXPERIENCE_GOOD,
                format!("Good experience (>10 years): +{}", weights::EXPERIENCE_GOOD),
            );
        } else {
            add(
                weights::EXPERIENCE_BASE,
                format!("Standard experience: +{}", weights::EXPERIENCE_BASE),
            );
        }
    }

    if let Some(rating) = provider.rating {
        if rating >= 4.8 {
            add(
                weights::RATING_EXCELLENT,
                format!("Excellent rating (>=4.8): +{}", weights::RATING_EXCELLENT),
            );
        } else if rating >= 4.5 {
            add(
                weights::RATING_GOOD,
                format!("Good rating (>=4.5): +{}", weights::RATING_GOOD),
            );
        } else {
            add(
                weights::RATING_BASE,
                format!("Average rating: +{}", weights::RATING_BASE),
            );
        }
    }

    let condition_hit = criteria
        .condition
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .is_some_and(|condition| {
            provider
                .conditions
                .iter()
                .any(|c| c.eq_ignore_ascii_case(condition))
        });
    if condition_hit {
        add(
            weights::CONDITION_MATCH,
            format!("Condition-specific expertise: +{}", weights::CONDITION_MATCH),
        );
    }

    if criteria.urgency != Urgency::Routine
        && provider.availability_days.is_some_and(|d| d <= 3)
    {
        add(
            weights::URGENT_AVAILABILITY,
            format!(
                "Quick availability for urgent case: +{}",
                weights::URGENT_AVAILABILITY
            ),
        );
    }

    if criteria
        .location
        .as_deref()
        .is_some_and(|loc| state_matches(&provider, loc))
    {
        add(
            weights::SAME_STATE,
            format!("Location compatibility: +{}", weights::SAME_STATE),
        );
    }

    let language_hit = criteria
        .language
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .is_some_and(|lang| {
            provider
                .languages
                .iter()
                .any(|l| l.eq_ignore_ascii_case(lang))
        });
    if language_hit {
        add(
            weights::LANGUAGE,
            format!("Language preference match: +{}", weights::LANGUAGE),
        );
    }

    if criteria.telemedicine_preferred && provider.telemedicine {
        add(
            weights::TELEMEDICINE,
            format!("Telemedicine available: +{}", weights::TELEMEDICINE),
        );
    }

    let match_percentage = percentage(score, config.max_plausible_score);
    ScoredCandidate {
        provider,
        match_score: score,
        match_percentage,
        scoring_factors: factors,
        distance: None,
        travel_time_minutes: None,
    }
}

fn percentage(score: i32, max_plausible: i32) -> u8 {
    let pct = (f64::from(score) / f64::from(max_plausible.max(1)) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
