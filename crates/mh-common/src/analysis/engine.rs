use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::analysis::formatter::{
    build_record, enforce_score_caps, fallback_payload, fallback_response, recover_response,
    recovered_payload,
};
use crate::analysis::generator::{GenerationError, TextGenerator};
use crate::analysis::parse::{ParseError, parse_model_payload};
use crate::analysis::prompt::{build_match_prompt, preprocess_match_data};
use crate::analysis::record::AnalysisOutcome;
use crate::analysis::response::MatchWireResponse;
use crate::db::applications::ApplicationStorageError;
use crate::db::candidates::CandidateFetchError;
use crate::db::jobs::JobFetchError;
use crate::db::{PgPool, fetch_candidate, fetch_job, save_analysis_outcome};
use crate::matching::{SalaryRange, estimate_salary_range};
use crate::retry::{RetryPolicy, retry_with_policy};
use crate::{Candidate, JobPosting};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("candidate not found: {0}")]
    CandidateNotFound(i64),
    #[error("job posting not found: {0}")]
    JobNotFound(i64),
    #[error("no application found for candidate {candidate_id} and job {job_id}")]
    ApplicationMissing { candidate_id: i64, job_id: i64 },
    #[error(transparent)]
    CandidateStorage(#[from] CandidateFetchError),
    #[error(transparent)]
    JobStorage(#[from] JobFetchError),
    #[error(transparent)]
    ApplicationStorage(#[from] ApplicationStorageError),
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error(transparent)]
    Generate(#[from] GenerationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// One model request plus parse/structural check, retried under `policy`.
/// None once the attempt budget is spent; generation flakiness never
/// propagates further than this.
pub(crate) async fn generate_structured_payload<G: TextGenerator>(
    generator: &G,
    policy: &RetryPolicy,
    prompt: &str,
) -> Option<Value> {
    retry_with_policy(policy, |attempt| async move {
        let outcome: Result<Value, AttemptError> = async {
            let text = generator.generate_content(prompt).await?;
            Ok(parse_model_payload(&text)?)
        }
        .await;

        if let Err(err) = &outcome {
            warn!(attempt, error = %err, "match analysis attempt failed");
        }
        outcome
    })
    .await
    .ok()
}

fn fallback_outcome(salary: SalaryRange) -> AnalysisOutcome {
    AnalysisOutcome::Fallback(fallback_payload(&fallback_response(), salary))
}

/// Turn a structurally valid payload into a persisted outcome: typed
/// validation with score caps, field-level recovery when validation fails,
/// fallback when recovery fails too.
pub(crate) fn outcome_from_payload(
    payload: &Value,
    salary: SalaryRange,
    candidate_skills: &[String],
) -> AnalysisOutcome {
    match serde_json::from_value::<MatchWireResponse>(payload.clone()) {
        Ok(mut wire) => {
            enforce_score_caps(&mut wire.resume);
            AnalysisOutcome::Complete(build_record(&wire, salary, candidate_skills))
        }
        Err(err) => {
            warn!(error = %err, "model response failed validation; attempting field recovery");
            match recover_response(payload) {
                Ok(wire) => AnalysisOutcome::Recovered(recovered_payload(&wire, salary)),
                Err(recover_err) => {
                    warn!(error = %recover_err, "recovery failed; using fallback");
                    fallback_outcome(salary)
                }
            }
        }
    }
}

fn salary_estimate(candidate: &Candidate, job: &JobPosting) -> SalaryRange {
    estimate_salary_range(
        candidate.years_of_experience.unwrap_or(0),
        &candidate.skills,
        &candidate.education_summary(),
        job.title.as_deref().unwrap_or(""),
    )
}

/// Orchestrates one candidate/job match analysis: load both records, build
/// the prompt with heuristic hints, call the model with bounded retries,
/// validate/recover/fall back, persist onto the application.
pub struct MatchAnalysisEngine<G> {
    pool: PgPool,
    generator: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> MatchAnalysisEngine<G> {
    pub fn new(pool: PgPool, generator: G) -> Self {
        Self::with_policy(pool, generator, RetryPolicy::generation_default())
    }

    pub fn with_policy(pool: PgPool, generator: G, policy: RetryPolicy) -> Self {
        Self {
            pool,
            generator,
            policy,
        }
    }

    /// Analyze one pair and persist the result. Missing entities propagate;
    /// every other failure mode still leaves a persisted analysis.
    #[instrument(skip(self))]
    pub async fn analyze(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let (candidate, job) = tokio::join!(
            fetch_candidate(&self.pool, candidate_id),
            fetch_job(&self.pool, job_id),
        );
        let candidate = candidate?.ok_or(AnalysisError::CandidateNotFound(candidate_id))?;
        let job = job?.ok_or(AnalysisError::JobNotFound(job_id))?;

        let hints = preprocess_match_data(&job, &candidate);
        info!(hint_count = hints.len(), "computed heuristic skill hints");
        let prompt = build_match_prompt(&job, &candidate, &hints);

        let salary = salary_estimate(&candidate, &job);

        let outcome =
            match generate_structured_payload(&self.generator, &self.policy, &prompt).await {
                Some(payload) => outcome_from_payload(&payload, salary, &candidate.skills),
                None => {
                    warn!("no structurally valid model response after retries; using fallback");
                    fallback_outcome(salary)
                }
            };

        self.persist(candidate_id, job_id, &outcome).await?;
        info!(
            provenance = outcome.provenance(),
            score = outcome.global_score(),
            "analysis persisted"
        );
        Ok(outcome)
    }

    async fn persist(
        &self,
        candidate_id: i64,
        job_id: i64,
        outcome: &AnalysisOutcome,
    ) -> Result<(), AnalysisError> {
        let rows =
            save_analysis_outcome(&self.pool, candidate_id, job_id, outcome, Utc::now()).await?;
        if rows == 0 {
            return Err(AnalysisError::ApplicationMissing {
                candidate_id,
                job_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::formatter::FALLBACK_SCORE;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate_content(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyResponse))
        }
    }

    fn salary() -> SalaryRange {
        SalaryRange {
            min: 1500,
            max: 2500,
            currency: "TND".into(),
        }
    }

    fn valid_payload() -> String {
        json!({
            "resume": {
                "score": 72,
                "correspondance": {
                    "competences": 80,
                    "experience": true,
                    "formation": true,
                    "langues": 60
                },
                "matchedKeywords": ["Node.js"]
            },
            "signauxAlerte": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn fenced_json_succeeds_on_the_first_attempt() {
        let generator = ScriptedGenerator::new(vec![Ok(format!("```json\n{}\n```", valid_payload()))]);

        let payload = generate_structured_payload(
            &generator,
            &RetryPolicy::generation_default(),
            "prompt",
        )
        .await;

        assert!(payload.is_some());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn three_plain_text_replies_exhaust_the_budget() {
        let generator = ScriptedGenerator::new(vec![
            Ok("I cannot analyze this".into()),
            Ok("I cannot analyze this".into()),
            Ok("I cannot analyze this".into()),
        ]);

        let payload = generate_structured_payload(
            &generator,
            &RetryPolicy::generation_default(),
            "prompt",
        )
        .await;

        assert!(payload.is_none());
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn transport_errors_retry_until_a_valid_reply() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::Transport("timeout".into())),
            Ok(r#"{"no":"sections"}"#.into()),
            Ok(valid_payload()),
        ]);

        let payload = generate_structured_payload(
            &generator,
            &RetryPolicy::generation_default(),
            "prompt",
        )
        .await;

        assert!(payload.is_some());
        assert_eq!(generator.calls(), 3);
    }

    #[test]
    fn valid_payload_yields_complete_with_caps_applied() {
        let payload = json!({
            "resume": {
                "score": 90,
                "correspondance": {
                    "competences": 90,
                    "experience": false,
                    "formation": true,
                    "langues": 70
                }
            },
            "signauxAlerte": []
        });

        let outcome = outcome_from_payload(&payload, salary(), &["Rust".to_string()]);

        let AnalysisOutcome::Complete(record) = outcome else {
            panic!("expected a complete outcome");
        };
        // Experience requirement unmet: the cap holds regardless of sub-scores.
        assert_eq!(record.adequacy.global, 50);
        assert!(!record.adequacy.experience);
    }

    #[test]
    fn invalid_structure_yields_recovered() {
        let payload = json!({
            "resume": {
                "score": "quatre-vingt",
                "correspondance": {}
            },
            "signauxAlerte": "rien"
        });

        let outcome = outcome_from_payload(&payload, salary(), &[]);

        let AnalysisOutcome::Recovered(recovered) = outcome else {
            panic!("expected a recovered outcome");
        };
        assert_eq!(recovered.score, 0);
        assert_eq!(recovered.alerts.len(), 1);
        assert!(!recovered.matched_keywords.is_empty());
    }

    #[test]
    fn non_object_payload_yields_fallback() {
        let outcome = outcome_from_payload(&json!("not an object"), salary(), &[]);

        let AnalysisOutcome::Fallback(fallback) = outcome else {
            panic!("expected a fallback outcome");
        };
        assert_eq!(fallback.score, FALLBACK_SCORE);
        assert_eq!(fallback.alerts.len(), 1);
    }

    #[test]
    fn fallback_outcome_is_neutral() {
        let outcome = fallback_outcome(salary());

        assert_eq!(outcome.provenance(), "fallback");
        assert_eq!(outcome.global_score(), 50);
        let AnalysisOutcome::Fallback(fallback) = outcome else {
            unreachable!();
        };
        assert_eq!(fallback.alerts.len(), 1);
    }
}
