use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("model output is not JSON: {0}")]
    NotJson(String),
    #[error("model output is missing the resume/signauxAlerte sections")]
    MissingSections,
}

/// Strip markdown code fences the model tends to wrap its JSON in.
pub fn clean_model_output(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Widest `{...}` substring, for salvaging JSON out of chatty output.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

fn prefix_of(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Parse one model reply into a structurally valid payload: fences stripped,
/// a JSON object salvaged if the reply does not start with `{`, and both
/// top-level sections present. Anything less is a retryable parse error.
pub fn parse_model_payload(raw: &str) -> Result<Value, ParseError> {
    let cleaned = clean_model_output(raw);

    let text = if cleaned.starts_with('{') {
        cleaned.as_str()
    } else {
        extract_json_object(&cleaned).ok_or_else(|| ParseError::NotJson(prefix_of(&cleaned)))?
    };

    let value: Value =
        serde_json::from_str(text).map_err(|_| ParseError::NotJson(prefix_of(text)))?;

    if value.get("resume").is_some() && value.get("signauxAlerte").is_some() {
        Ok(value)
    } else {
        Err(ParseError::MissingSections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"resume":{"score":50},"signauxAlerte":[]}"#;

    #[test]
    fn parses_fenced_json_without_retry() {
        let raw = format!("```json\n{MINIMAL}\n```");

        let value = parse_model_payload(&raw).unwrap();
        assert_eq!(value["resume"]["score"], 50);
        assert!(value["signauxAlerte"].as_array().unwrap().is_empty());
    }

    #[test]
    fn salvages_object_embedded_in_prose() {
        let raw = format!("Voici l'analyse demandée :\n{MINIMAL}\nBonne journée !");

        let value = parse_model_payload(&raw).unwrap();
        assert!(value.get("resume").is_some());
    }

    #[test]
    fn plain_text_is_not_json() {
        let err = parse_model_payload("I cannot analyze this").unwrap_err();
        assert!(matches!(err, ParseError::NotJson(_)));
    }

    #[test]
    fn missing_sections_are_rejected() {
        let err = parse_model_payload(r#"{"resume":{"score":10}}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingSections));

        let err = parse_model_payload(r#"{"signauxAlerte":[]}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingSections));
    }

    #[test]
    fn not_json_error_keeps_a_short_prefix() {
        let long = "x".repeat(200);
        let ParseError::NotJson(prefix) = parse_model_payload(&long).unwrap_err() else {
            panic!("expected NotJson");
        };
        assert_eq!(prefix.len(), 50);
    }
}
