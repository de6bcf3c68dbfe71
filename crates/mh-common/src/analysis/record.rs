use serde::{Deserialize, Serialize};

use crate::analysis::evaluation::{CategoryFit, Decision, HiringPotential, MatchLevel, RecruitmentWindow};
use crate::analysis::response::{AlertCategory, Severity};
use crate::matching::SalaryRange;

/// Persisted analysis subdocument of an application. Tagged by provenance:
/// a fully validated model response, a field-level salvage, or the neutral
/// fallback used when generation and recovery both failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Complete(AnalysisRecord),
    Recovered(RecoveredAnalysis),
    Fallback(FallbackAnalysis),
}

impl AnalysisOutcome {
    pub fn provenance(&self) -> &'static str {
        match self {
            AnalysisOutcome::Complete(_) => "complete",
            AnalysisOutcome::Recovered(_) => "recovered",
            AnalysisOutcome::Fallback(_) => "fallback",
        }
    }

    pub fn global_score(&self) -> i32 {
        match self {
            AnalysisOutcome::Complete(record) => record.adequacy.global,
            AnalysisOutcome::Recovered(recovered) => recovered.score,
            AnalysisOutcome::Fallback(fallback) => fallback.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub adequacy: AdequacyScore,
    pub matched_keywords: Vec<String>,
    pub highlights: Vec<String>,
    pub alerts: Vec<AnalysisAlert>,
    pub market: MarketOutlook,
    pub summary: AdequacySummary,
    pub recommendation: RecruiterRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdequacyScore {
    pub global: i32,
    pub skills: i32,
    pub experience: bool,
    pub education: bool,
    pub languages: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisAlert {
    pub category: AlertCategory,
    pub description: String,
    pub severity: Severity,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutlook {
    pub salary_range: SalaryRange,
    pub hiring_potential: HiringPotential,
    pub in_demand_skills: Vec<String>,
    pub estimated_recruitment_time: RecruitmentWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdequacySummary {
    pub recommended: bool,
    pub match_level: MatchLevel,
    pub reason: String,
    pub skills_fit: CategoryFit,
    pub experience_fit: CategoryFit,
    pub education_fit: CategoryFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruiterRecommendation {
    pub decision: Decision,
    pub suggested_action: String,
    pub candidate_feedback: Vec<String>,
}

/// Best-effort salvage of a malformed payload; only the fields that survived
/// the type guards, plus the salary computed from the candidate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveredAnalysis {
    pub score: i32,
    pub matched_keywords: Vec<String>,
    pub highlights: Vec<String>,
    pub alerts: Vec<AnalysisAlert>,
    pub salary_range: SalaryRange,
}

/// Fixed neutral record persisted when every generation attempt failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackAnalysis {
    pub score: i32,
    pub matched_keywords: Vec<String>,
    pub alerts: Vec<AnalysisAlert>,
    pub salary_range: SalaryRange,
}
