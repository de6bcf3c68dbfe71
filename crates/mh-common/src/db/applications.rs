use chrono::{DateTime, Duration, Utc};
use deadpool_postgres::PoolError;
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::analysis::record::AnalysisOutcome;
use crate::db::PgPool;

/// Lifecycle of an application; only the pipeline moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Analyzing,
    Analyzed,
    AnalysisFailed,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Analyzing => "analyzing",
            ApplicationStatus::Analyzed => "analyzed",
            ApplicationStatus::AnalysisFailed => "analysis_failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("candidate {candidate_id} has already applied to job {job_id}")]
    AlreadyApplied { candidate_id: i64, job_id: i64 },
    #[error("candidate not found: {0}")]
    CandidateNotFound(i64),
    #[error("job posting not found: {0}")]
    JobNotFound(i64),
    #[error("failed to map application row: {0}")]
    Mapping(String),
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: i64,
    pub candidate_id: i64,
    pub job_id: i64,
    pub company_id: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
    pub status_note: Option<String>,
    pub rejected: bool,
    pub analysis: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn parse_status(value: &str) -> Result<ApplicationStatus, ApplicationStorageError> {
    match value {
        "pending" => Ok(ApplicationStatus::Pending),
        "analyzing" => Ok(ApplicationStatus::Analyzing),
        "analyzed" => Ok(ApplicationStatus::Analyzed),
        "analysis_failed" => Ok(ApplicationStatus::AnalysisFailed),
        other => Err(ApplicationStorageError::Mapping(format!(
            "unknown application status: {other}"
        ))),
    }
}

fn row_to_application(row: &Row) -> Result<ApplicationRecord, ApplicationStorageError> {
    Ok(ApplicationRecord {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        job_id: row.try_get("job_id")?,
        company_id: row.try_get("company_id")?,
        submitted_at: row.try_get("submitted_at")?,
        analyzed_at: row.try_get("analyzed_at")?,
        status: parse_status(row.try_get::<_, String>("status")?.as_str())?,
        status_note: row.try_get("status_note")?,
        rejected: row.try_get("rejected")?,
        analysis: row.try_get("analysis")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Submit an application. One transaction covers the duplicate check, the
/// entity checks, the insert, the job back-reference and the analysis-job
/// enqueue, so a submitted application always has exactly one queue entry.
#[instrument(skip(pool))]
pub async fn create_application(
    pool: &PgPool,
    candidate_id: i64,
    job_id: i64,
) -> Result<i64, ApplicationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let duplicate = tx
        .query_opt(
            "SELECT id FROM recruit.applications WHERE candidate_id = $1 AND job_id = $2",
            &[&candidate_id, &job_id],
        )
        .await?;
    if duplicate.is_some() {
        return Err(ApplicationStorageError::AlreadyApplied {
            candidate_id,
            job_id,
        });
    }

    let candidate = tx
        .query_opt(
            "SELECT id FROM recruit.candidates WHERE id = $1",
            &[&candidate_id],
        )
        .await?;
    if candidate.is_none() {
        return Err(ApplicationStorageError::CandidateNotFound(candidate_id));
    }

    let job = tx
        .query_opt(
            "SELECT id, company_id FROM recruit.jobs WHERE id = $1",
            &[&job_id],
        )
        .await?;
    let Some(job) = job else {
        return Err(ApplicationStorageError::JobNotFound(job_id));
    };
    let company_id: Option<i64> = job.try_get("company_id")?;

    let inserted = tx
        .query_one(
            "INSERT INTO recruit.applications (candidate_id, job_id, company_id, submitted_at, status)
             VALUES ($1, $2, $3, NOW(), 'pending')
             RETURNING id",
            &[&candidate_id, &job_id, &company_id],
        )
        .await
        .map_err(|err| {
            // The unique pair constraint closes the duplicate-check race.
            if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                ApplicationStorageError::AlreadyApplied {
                    candidate_id,
                    job_id,
                }
            } else {
                ApplicationStorageError::Postgres(err)
            }
        })?;
    let application_id: i64 = inserted.try_get("id")?;

    tx.execute(
        "UPDATE recruit.jobs
         SET application_ids = array_append(application_ids, $1), updated_at = NOW()
         WHERE id = $2",
        &[&application_id, &job_id],
    )
    .await?;

    // Submission is the single trigger for analysis: the queue entry rides
    // the same transaction as the application row.
    tx.execute(
        "INSERT INTO recruit.analysis_queue (application_id) VALUES ($1)",
        &[&application_id],
    )
    .await?;

    tx.commit().await?;
    Ok(application_id)
}

#[instrument(skip(pool))]
pub async fn fetch_application(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ApplicationRecord>, ApplicationStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_opt("SELECT * FROM recruit.applications WHERE id = $1", &[&id])
        .await?;
    row.map(|r| row_to_application(&r)).transpose()
}

/// Transient state while a worker holds the job.
#[instrument(skip(pool))]
pub async fn mark_analyzing(
    pool: &PgPool,
    application_id: i64,
) -> Result<u64, ApplicationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE recruit.applications
             SET status = 'analyzing', updated_at = NOW()
             WHERE id = $1",
            &[&application_id],
        )
        .await?;
    Ok(rows)
}

/// Terminal handler failure: the application stays explainable instead of
/// hanging in `analyzing`.
#[instrument(skip(pool, reason))]
pub async fn mark_analysis_failed(
    pool: &PgPool,
    application_id: i64,
    reason: &str,
) -> Result<u64, ApplicationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE recruit.applications
             SET status = 'analysis_failed', status_note = $2, updated_at = NOW()
             WHERE id = $1",
            &[&application_id, &reason],
        )
        .await?;
    Ok(rows)
}

/// Persist an analysis result onto the application matching the pair.
/// A single targeted update; never inserts. Returns the row count so the
/// caller can surface a missing application.
#[instrument(skip(pool, outcome))]
pub async fn save_analysis_outcome(
    pool: &PgPool,
    candidate_id: i64,
    job_id: i64,
    outcome: &AnalysisOutcome,
    now: DateTime<Utc>,
) -> Result<u64, ApplicationStorageError> {
    let payload = serde_json::to_value(outcome)
        .map_err(|err| ApplicationStorageError::Mapping(err.to_string()))?;

    let client = pool.get().await?;
    let rows = client
        .execute(
            "UPDATE recruit.applications
             SET status = 'analyzed',
                 analyzed_at = $3,
                 analysis = $4,
                 status_note = NULL,
                 updated_at = $3
             WHERE candidate_id = $1 AND job_id = $2",
            &[&candidate_id, &job_id, &now, &Json(&payload)],
        )
        .await?;
    Ok(rows)
}

pub const STUCK_RESET_NOTE: &str = "Reset due to stuck analysis";

/// Whether an application sitting in `analyzing` has exceeded the in-flight
/// budget and should be reset by the maintenance sweep.
pub fn is_stuck(
    status: ApplicationStatus,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    max_in_analysis: Duration,
) -> bool {
    status == ApplicationStatus::Analyzing && updated_at <= now - max_in_analysis
}

/// Reset applications stuck in `analyzing` back to `pending` with an
/// explanatory note. The only force-reset outside the normal pipeline.
#[instrument(skip(pool))]
pub async fn reset_stuck_applications(
    pool: &PgPool,
    now: DateTime<Utc>,
    max_in_analysis: Duration,
) -> Result<u64, ApplicationStorageError> {
    let client = pool.get().await?;
    let cutoff = now - max_in_analysis;

    let rows = client
        .execute(
            "UPDATE recruit.applications
             SET status = 'pending', status_note = $1, updated_at = $2
             WHERE status = 'analyzing' AND updated_at <= $3",
            &[&STUCK_RESET_NOTE, &now, &cutoff],
        )
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Analyzing,
            ApplicationStatus::Analyzed,
            ApplicationStatus::AnalysisFailed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        let err = parse_status("en_attente").unwrap_err();
        assert!(format!("{err}").contains("unknown application status"));
    }

    #[test]
    fn two_hours_in_analyzing_is_stuck() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        assert!(is_stuck(
            ApplicationStatus::Analyzing,
            now - Duration::hours(2),
            now,
            Duration::hours(1),
        ));
    }

    #[test]
    fn five_minutes_in_analyzing_is_not_stuck() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        assert!(!is_stuck(
            ApplicationStatus::Analyzing,
            now - Duration::minutes(5),
            now,
            Duration::hours(1),
        ));
    }

    #[test]
    fn non_analyzing_statuses_are_never_stuck() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Analyzed,
            ApplicationStatus::AnalysisFailed,
        ] {
            assert!(!is_stuck(status, now - Duration::days(3), now, Duration::hours(1)));
        }
    }

    #[test]
    fn already_applied_error_names_the_pair() {
        let err = ApplicationStorageError::AlreadyApplied {
            candidate_id: 4,
            job_id: 9,
        };
        assert_eq!(
            format!("{err}"),
            "candidate 4 has already applied to job 9"
        );
    }
}
