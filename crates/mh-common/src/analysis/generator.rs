use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Opaque remote text generation. No JSON guarantee, no latency bound; the
/// engine owns retries and degradation.
pub trait TextGenerator: Send + Sync {
    fn generate_content(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    #[error("text generation request failed: {0}")]
    Transport(String),
    #[error("text generation api returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("text generation returned an empty response")]
    EmptyResponse,
    #[error("unexpected response shape from text generation api: {0}")]
    Malformed(String),
}

const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Resolve from the environment. The API key is mandatory; model,
    /// endpoint and timeout fall back to service defaults.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let model =
            std::env::var("MH_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let endpoint = std::env::var("MH_GEMINI_ENDPOINT").unwrap_or_else(|_| {
            format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent")
        });

        Ok(Self {
            api_key,
            model,
            endpoint,
            timeout: Duration::from_secs(parse_u64(
                "MH_GEMINI_TIMEOUT_SECONDS",
                DEFAULT_TIMEOUT_SECS,
            )),
        })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
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

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// Gemini REST client behind the `TextGenerator` seam.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self, GenerationError> {
        Self::new(GeminiConfig::from_env()?)
    }
}

impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(prompt_len = prompt.len(), "sending generation request");

        let response = self
            .http
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Malformed(err.to_string()))?;

        extract_text(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let old = std::env::var(key).ok();
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
                (key.to_string(), old)
            })
            .collect();

        f();

        for (key, old) in previous {
            match old {
                Some(v) => unsafe { std::env::set_var(&key, v) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }

    #[test]
    fn config_requires_an_api_key() {
        with_env(&[("GEMINI_API_KEY", None)], || {
            assert!(matches!(
                GeminiConfig::from_env(),
                Err(GenerationError::MissingApiKey)
            ));
        });

        with_env(&[("GEMINI_API_KEY", Some(""))], || {
            assert!(matches!(
                GeminiConfig::from_env(),
                Err(GenerationError::MissingApiKey)
            ));
        });
    }

    #[test]
    fn config_defaults_follow_the_model_name() {
        with_env(
            &[
                ("GEMINI_API_KEY", Some("secret")),
                ("MH_GEMINI_MODEL", None),
                ("MH_GEMINI_ENDPOINT", None),
                ("MH_GEMINI_TIMEOUT_SECONDS", None),
            ],
            || {
                let config = GeminiConfig::from_env().unwrap();
                assert_eq!(config.model, DEFAULT_MODEL);
                assert!(config.endpoint.ends_with(&format!("{DEFAULT_MODEL}:generateContent")));
                assert_eq!(config.timeout, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn config_reads_env_overrides() {
        with_env(
            &[
                ("GEMINI_API_KEY", Some("secret")),
                ("MH_GEMINI_MODEL", Some("gemini-exp")),
                ("MH_GEMINI_ENDPOINT", Some("https://example.com/generate")),
                ("MH_GEMINI_TIMEOUT_SECONDS", Some("45")),
            ],
            || {
                let config = GeminiConfig::from_env().unwrap();
                assert_eq!(config.model, "gemini-exp");
                assert_eq!(config.endpoint, "https://example.com/generate");
                assert_eq!(config.timeout, Duration::from_secs(45));
            },
        );
    }

    #[test]
    fn extract_text_joins_parts_and_trims() {
        let response = GenerateContentResponse {
            candidates: vec![ResponseCandidate {
                content: Some(ResponseContent {
                    parts: vec![
                        ResponsePart {
                            text: "  {\"resume\":".into(),
                        },
                        ResponsePart {
                            text: "{}}  ".into(),
                        },
                    ],
                }),
            }],
        };

        assert_eq!(extract_text(response).unwrap(), "{\"resume\":{}}");
    }

    #[test]
    fn extract_text_rejects_empty_candidates() {
        let response = GenerateContentResponse { candidates: vec![] };
        assert!(matches!(
            extract_text(response),
            Err(GenerationError::EmptyResponse)
        ));
    }
}
