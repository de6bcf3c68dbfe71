use serde::{Deserialize, Serialize};

/// JSON contract with the model. Keys and enum values are the platform's
/// French vocabulary; optional arrays default to empty so a terse but
/// structurally valid response still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchWireResponse {
    pub resume: WireResume,
    #[serde(rename = "signauxAlerte")]
    pub alerts: Vec<WireAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResume {
    pub score: f64,
    pub correspondance: WireCorrespondence,
    #[serde(default, rename = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
    #[serde(default, rename = "highlightsToStandOut")]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCorrespondence {
    pub competences: f64,
    pub experience: bool,
    pub formation: bool,
    pub langues: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAlert {
    #[serde(rename = "type")]
    pub category: AlertCategory,
    #[serde(rename = "probleme")]
    pub description: String,
    #[serde(rename = "severite")]
    pub severity: Severity,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    #[serde(rename = "Compétence")]
    Skill,
    #[serde(rename = "Expérience")]
    Experience,
    #[serde(rename = "Formation")]
    Education,
    #[serde(rename = "Langue")]
    Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "faible")]
    Low,
    #[serde(rename = "moyenne")]
    Medium,
    #[serde(rename = "élevée")]
    High,
}

impl Severity {
    /// Ordering weight for feedback sorting (higher = more severe).
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_french_wire_payload() {
        let payload = json!({
            "resume": {
                "score": 72,
                "correspondance": {
                    "competences": 80,
                    "experience": true,
                    "formation": true,
                    "langues": 60
                },
                "matchedKeywords": ["Node.js"],
                "highlightsToStandOut": ["5 ans d'expérience backend"],
                "suggestions": []
            },
            "signauxAlerte": [
                {
                    "type": "Langue",
                    "probleme": "Anglais professionnel non confirmé",
                    "severite": "moyenne",
                    "score": 60
                }
            ]
        });

        let response: MatchWireResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(response.resume.score, 72.0);
        assert_eq!(response.alerts.len(), 1);
        assert_eq!(response.alerts[0].category, AlertCategory::Language);
        assert_eq!(response.alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn missing_optional_arrays_default_to_empty() {
        let payload = json!({
            "resume": {
                "score": 40,
                "correspondance": {
                    "competences": 35,
                    "experience": false,
                    "formation": false,
                    "langues": 50
                }
            },
            "signauxAlerte": []
        });

        let response: MatchWireResponse = serde_json::from_value(payload).unwrap();
        assert!(response.resume.matched_keywords.is_empty());
        assert!(response.resume.highlights.is_empty());
        assert!(response.resume.suggestions.is_empty());
    }

    #[test]
    fn alert_score_defaults_to_zero() {
        let payload = json!({
            "type": "Compétence",
            "probleme": "Kubernetes manquant",
            "severite": "élevée"
        });

        let alert: WireAlert = serde_json::from_value(payload).unwrap();
        assert_eq!(alert.score, 0.0);
    }

    #[test]
    fn severity_ranks_are_ordered() {
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
    }
}
