use serde_json::Value;

use crate::analysis::evaluation::{
    candidate_feedback, decision, fit_for_category, hiring_potential, match_level,
    recruitment_window, suggested_action,
};
use crate::analysis::record::{
    AdequacyScore, AdequacySummary, AnalysisAlert, AnalysisRecord, FallbackAnalysis,
    MarketOutlook, RecoveredAnalysis, RecruiterRecommendation,
};
use crate::analysis::response::{
    AlertCategory, MatchWireResponse, Severity, WireAlert, WireCorrespondence, WireResume,
};
use crate::matching::SalaryRange;

pub const FALLBACK_SCORE: i32 = 50;

const MAX_RECOVERED_SUGGESTIONS: usize = 5;
const MAX_RECOVERED_ALERTS: usize = 10;

#[derive(Debug, thiserror::Error)]
#[error("partial payload is not a JSON object")]
pub struct RecoveryError;

fn clamp_score(value: f64) -> i32 {
    value.round().clamp(0.0, 100.0) as i32
}

/// Re-apply the strict scoring rules after validation so the persisted score
/// honors the caps even when the model ignored them. Idempotent.
pub fn enforce_score_caps(resume: &mut WireResume) {
    if !resume.correspondance.experience {
        resume.score = resume.score.min(50.0);
    }
    if !resume.correspondance.formation {
        resume.score = resume.score.min(50.0);
    }
    if resume.correspondance.competences < 40.0 {
        resume.score = resume.score.min(30.0);
    }
}

fn canonical_alerts(alerts: &[WireAlert]) -> Vec<AnalysisAlert> {
    alerts
        .iter()
        .map(|alert| AnalysisAlert {
            category: alert.category,
            description: alert.description.clone(),
            severity: alert.severity,
            score: clamp_score(alert.score),
        })
        .collect()
}

/// Canonical analysis record for a validated model response.
pub fn build_record(
    wire: &MatchWireResponse,
    salary: SalaryRange,
    candidate_skills: &[String],
) -> AnalysisRecord {
    let score = clamp_score(wire.resume.score);
    let alerts = canonical_alerts(&wire.alerts);

    AnalysisRecord {
        adequacy: AdequacyScore {
            global: score,
            skills: clamp_score(wire.resume.correspondance.competences),
            experience: wire.resume.correspondance.experience,
            education: wire.resume.correspondance.formation,
            languages: clamp_score(wire.resume.correspondance.langues),
        },
        matched_keywords: wire.resume.matched_keywords.clone(),
        highlights: wire.resume.highlights.clone(),
        market: MarketOutlook {
            salary_range: salary,
            hiring_potential: hiring_potential(score),
            in_demand_skills: candidate_skills.to_vec(),
            estimated_recruitment_time: recruitment_window(score),
        },
        summary: AdequacySummary {
            recommended: score > 50,
            match_level: match_level(score),
            reason: if score > 50 {
                "Profil correspondant au poste".into()
            } else {
                "Profil à améliorer".into()
            },
            skills_fit: fit_for_category(AlertCategory::Skill, &alerts),
            experience_fit: fit_for_category(AlertCategory::Experience, &alerts),
            education_fit: fit_for_category(AlertCategory::Education, &alerts),
        },
        recommendation: RecruiterRecommendation {
            decision: decision(score),
            suggested_action: suggested_action(&alerts),
            candidate_feedback: candidate_feedback(&alerts),
        },
        alerts,
    }
}

/// Neutral response used when every generation attempt failed.
pub fn fallback_response() -> MatchWireResponse {
    MatchWireResponse {
        resume: WireResume {
            score: FALLBACK_SCORE as f64,
            correspondance: WireCorrespondence {
                competences: 50.0,
                experience: false,
                formation: false,
                langues: 50.0,
            },
            matched_keywords: vec![
                "compétences techniques".into(),
                "aptitudes professionnelles".into(),
            ],
            highlights: Vec::new(),
            suggestions: vec![
                "L'analyse automatique n'a pas pu être complétée, veuillez examiner le profil manuellement"
                    .into(),
            ],
        },
        alerts: vec![WireAlert {
            category: AlertCategory::Skill,
            description: "L'analyse automatique n'a pas pu générer un résultat structuré".into(),
            severity: Severity::Medium,
            score: 0.0,
        }],
    }
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn recover_alert(value: &Value) -> Option<WireAlert> {
    let description = value.get("probleme")?.as_str()?.to_string();

    let category = value
        .get("type")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(AlertCategory::Skill);
    let severity = value
        .get("severite")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(Severity::Medium);

    Some(WireAlert {
        category,
        description,
        severity,
        score: value.get("score").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

/// Field-by-field salvage of a payload that failed typed validation.
/// Numbers default to 0, booleans to false, arrays to empty; the result
/// always carries at least one keyword and one alert so downstream
/// consumers never branch on empty-vs-present.
pub fn recover_response(partial: &Value) -> Result<MatchWireResponse, RecoveryError> {
    let root = partial.as_object().ok_or(RecoveryError)?;
    let resume = root.get("resume");
    let correspondance = resume.and_then(|r| r.get("correspondance"));

    let number = |value: Option<&Value>| value.and_then(Value::as_f64).unwrap_or(0.0);
    let boolean = |value: Option<&Value>| value.and_then(Value::as_bool).unwrap_or(false);

    let mut matched_keywords =
        string_array(resume.and_then(|r| r.get("matchedKeywords"))).unwrap_or_default();
    if matched_keywords.is_empty() {
        matched_keywords = vec!["technologies".into(), "compétences techniques".into()];
    }

    let suggestions = string_array(resume.and_then(|r| r.get("suggestions")))
        .map(|items| items.into_iter().take(MAX_RECOVERED_SUGGESTIONS).collect())
        .unwrap_or_else(|| {
            vec![
                "L'analyse automatique a rencontré des difficultés, veuillez vérifier manuellement"
                    .into(),
            ]
        });

    let mut alerts: Vec<WireAlert> = root
        .get("signauxAlerte")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(recover_alert)
                .take(MAX_RECOVERED_ALERTS)
                .collect()
        })
        .unwrap_or_default();

    if alerts.is_empty() {
        alerts.push(WireAlert {
            category: AlertCategory::Skill,
            description: "Données partiellement récupérées suite à une erreur d'analyse".into(),
            severity: Severity::Medium,
            score: 0.0,
        });
    }

    Ok(MatchWireResponse {
        resume: WireResume {
            score: number(resume.and_then(|r| r.get("score"))),
            correspondance: WireCorrespondence {
                competences: number(correspondance.and_then(|c| c.get("competences"))),
                experience: boolean(correspondance.and_then(|c| c.get("experience"))),
                formation: boolean(correspondance.and_then(|c| c.get("formation"))),
                langues: number(correspondance.and_then(|c| c.get("langues"))),
            },
            matched_keywords,
            highlights: string_array(resume.and_then(|r| r.get("highlightsToStandOut")))
                .unwrap_or_default(),
            suggestions,
        },
        alerts,
    })
}

/// Trim a salvaged response into the persisted recovered variant.
pub fn recovered_payload(wire: &MatchWireResponse, salary: SalaryRange) -> RecoveredAnalysis {
    RecoveredAnalysis {
        score: clamp_score(wire.resume.score),
        matched_keywords: wire.resume.matched_keywords.clone(),
        highlights: wire.resume.highlights.clone(),
        alerts: canonical_alerts(&wire.alerts),
        salary_range: salary,
    }
}

/// Trim the neutral response into the persisted fallback variant.
pub fn fallback_payload(wire: &MatchWireResponse, salary: SalaryRange) -> FallbackAnalysis {
    FallbackAnalysis {
        score: FALLBACK_SCORE,
        matched_keywords: wire.resume.matched_keywords.clone(),
        alerts: canonical_alerts(&wire.alerts),
        salary_range: salary,
    }
}
