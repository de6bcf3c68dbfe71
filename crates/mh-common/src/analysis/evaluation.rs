use serde::{Deserialize, Serialize};

use crate::analysis::record::AnalysisAlert;
use crate::analysis::response::{AlertCategory, Severity};

/// Overall adequacy label shown to recruiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Bon")]
    Good,
    #[serde(rename = "Moyen")]
    Average,
    #[serde(rename = "Faible")]
    Low,
}

/// Per-category fit derived from that category's alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryLevel {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Bon")]
    Good,
    #[serde(rename = "À améliorer")]
    NeedsImprovement,
    #[serde(rename = "Non évalué")]
    NotEvaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFit {
    pub level: CategoryLevel,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Recommandé fortement")]
    StronglyRecommended,
    #[serde(rename = "Recommandé")]
    Recommended,
    #[serde(rename = "À considérer")]
    Consider,
    #[serde(rename = "Non recommandé")]
    NotRecommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiringPotential {
    #[serde(rename = "Élevé")]
    High,
    #[serde(rename = "Moyen")]
    Medium,
    #[serde(rename = "Faible")]
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecruitmentWindow {
    #[serde(rename = "1-2 semaines")]
    OneToTwoWeeks,
    #[serde(rename = "2-4 semaines")]
    TwoToFourWeeks,
    #[serde(rename = "4+ semaines")]
    FourPlusWeeks,
}

pub fn match_level(score: i32) -> MatchLevel {
    match score {
        s if s >= 85 => MatchLevel::Excellent,
        s if s >= 70 => MatchLevel::Good,
        s if s >= 50 => MatchLevel::Average,
        _ => MatchLevel::Low,
    }
}

pub fn decision(score: i32) -> Decision {
    match score {
        s if s >= 85 => Decision::StronglyRecommended,
        s if s >= 70 => Decision::Recommended,
        s if s >= 50 => Decision::Consider,
        _ => Decision::NotRecommended,
    }
}

pub fn hiring_potential(score: i32) -> HiringPotential {
    match score {
        s if s >= 65 => HiringPotential::High,
        s if s >= 50 => HiringPotential::Medium,
        _ => HiringPotential::Low,
    }
}

pub fn recruitment_window(score: i32) -> RecruitmentWindow {
    match score {
        s if s >= 75 => RecruitmentWindow::OneToTwoWeeks,
        s if s >= 60 => RecruitmentWindow::TwoToFourWeeks,
        _ => RecruitmentWindow::FourPlusWeeks,
    }
}

/// Fit for one category, read off the first alert raised against it. No
/// alert means the model saw nothing to flag there.
pub fn fit_for_category(category: AlertCategory, alerts: &[AnalysisAlert]) -> CategoryFit {
    let Some(alert) = alerts.iter().find(|alert| alert.category == category) else {
        return CategoryFit {
            level: CategoryLevel::NotEvaluated,
            details: Vec::new(),
        };
    };

    let level = match alert.severity {
        Severity::Low => CategoryLevel::Excellent,
        Severity::Medium => CategoryLevel::Good,
        Severity::High => CategoryLevel::NeedsImprovement,
    };

    CategoryFit {
        level,
        details: vec![alert.description.clone()],
    }
}

/// Next step for the recruiter, leading with the most severe open alert.
pub fn suggested_action(alerts: &[AnalysisAlert]) -> String {
    if let Some(alert) = alerts.iter().find(|a| a.severity == Severity::High) {
        return format!("Action prioritaire: {}", alert.description);
    }
    if let Some(alert) = alerts.iter().find(|a| a.severity == Severity::Medium) {
        return alert.description.clone();
    }
    "Procéder à l'évaluation standard".into()
}

/// Feedback lines for the candidate, most severe first (stable within the
/// same severity).
pub fn candidate_feedback(alerts: &[AnalysisAlert]) -> Vec<String> {
    let mut sorted: Vec<&AnalysisAlert> = alerts.iter().collect();
    sorted.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
    sorted
        .into_iter()
        .map(|alert| alert.description.clone())
        .filter(|description| !description.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(category: AlertCategory, severity: Severity, description: &str) -> AnalysisAlert {
        AnalysisAlert {
            category,
            description: description.into(),
            severity,
            score: 0,
        }
    }

    #[test]
    fn score_thresholds_map_to_labels() {
        assert_eq!(match_level(85), MatchLevel::Excellent);
        assert_eq!(match_level(70), MatchLevel::Good);
        assert_eq!(match_level(50), MatchLevel::Average);
        assert_eq!(match_level(49), MatchLevel::Low);

        assert_eq!(decision(85), Decision::StronglyRecommended);
        assert_eq!(decision(70), Decision::Recommended);
        assert_eq!(decision(50), Decision::Consider);
        assert_eq!(decision(49), Decision::NotRecommended);

        assert_eq!(hiring_potential(65), HiringPotential::High);
        assert_eq!(hiring_potential(50), HiringPotential::Medium);
        assert_eq!(hiring_potential(49), HiringPotential::Low);

        assert_eq!(recruitment_window(75), RecruitmentWindow::OneToTwoWeeks);
        assert_eq!(recruitment_window(60), RecruitmentWindow::TwoToFourWeeks);
        assert_eq!(recruitment_window(59), RecruitmentWindow::FourPlusWeeks);
    }

    #[test]
    fn category_without_alert_is_not_evaluated() {
        let alerts = vec![alert(AlertCategory::Skill, Severity::Low, "ok")];

        let fit = fit_for_category(AlertCategory::Education, &alerts);
        assert_eq!(fit.level, CategoryLevel::NotEvaluated);
        assert!(fit.details.is_empty());
    }

    #[test]
    fn category_level_follows_alert_severity() {
        let alerts = vec![
            alert(AlertCategory::Skill, Severity::High, "Kubernetes manquant"),
            alert(AlertCategory::Experience, Severity::Low, "Solide parcours"),
        ];

        let skills = fit_for_category(AlertCategory::Skill, &alerts);
        assert_eq!(skills.level, CategoryLevel::NeedsImprovement);
        assert_eq!(skills.details, vec!["Kubernetes manquant".to_string()]);

        let experience = fit_for_category(AlertCategory::Experience, &alerts);
        assert_eq!(experience.level, CategoryLevel::Excellent);
    }

    #[test]
    fn suggested_action_prioritizes_high_severity() {
        let alerts = vec![
            alert(AlertCategory::Language, Severity::Medium, "Anglais à confirmer"),
            alert(AlertCategory::Skill, Severity::High, "Kubernetes manquant"),
        ];

        assert_eq!(
            suggested_action(&alerts),
            "Action prioritaire: Kubernetes manquant"
        );
    }

    #[test]
    fn suggested_action_defaults_to_standard_evaluation() {
        assert_eq!(suggested_action(&[]), "Procéder à l'évaluation standard");

        let only_low = vec![alert(AlertCategory::Skill, Severity::Low, "ok")];
        assert_eq!(suggested_action(&only_low), "Procéder à l'évaluation standard");
    }

    #[test]
    fn candidate_feedback_sorted_by_severity() {
        let alerts = vec![
            alert(AlertCategory::Language, Severity::Low, "faible"),
            alert(AlertCategory::Skill, Severity::High, "grave"),
            alert(AlertCategory::Experience, Severity::Medium, "moyen"),
        ];

        assert_eq!(
            candidate_feedback(&alerts),
            vec!["grave".to_string(), "moyen".to_string(), "faible".to_string()]
        );
    }
}
