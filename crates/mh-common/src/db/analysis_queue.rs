use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::db::PgPool;
use crate::queue::job::{AnalysisJob, JobFailure, JobOptions, JobState, StallSweep, to_chrono};
use crate::retry::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum QueueStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map queue row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
}

fn parse_state(value: &str) -> Result<JobState, QueueStorageError> {
    match value {
        "waiting" => Ok(JobState::Waiting),
        "delayed" => Ok(JobState::Delayed),
        "active" => Ok(JobState::Active),
        "completed" => Ok(JobState::Completed),
        "failed" => Ok(JobState::Failed),
        other => Err(QueueStorageError::Mapping(format!(
            "unknown queue state: {other}"
        ))),
    }
}

fn row_to_job(row: &Row) -> Result<AnalysisJob, QueueStorageError> {
    Ok(AnalysisJob {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        state: parse_state(row.try_get::<_, String>("state")?.as_str())?,
        attempts: row.try_get("attempts")?,
        max_attempts: row.try_get("max_attempts")?,
        next_attempt_at: row.try_get("next_attempt_at")?,
        locked_by: row.try_get("locked_by")?,
        lock_expires_at: row.try_get("lock_expires_at")?,
        stalled_count: row.try_get("stalled_count")?,
        last_error: row.try_get("last_error")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[instrument(skip(pool, options))]
pub async fn enqueue_analysis_job(
    pool: &PgPool,
    application_id: i64,
    options: &JobOptions,
) -> Result<i64, QueueStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_one(
            "INSERT INTO recruit.analysis_queue (application_id, max_attempts)
             VALUES ($1, $2)
             RETURNING id",
            &[&application_id, &options.max_attempts],
        )
        .await?;
    Ok(row.try_get("id")?)
}

/// Lease the oldest due job: waiting/delayed with a due `next_attempt_at`,
/// picked with `FOR UPDATE SKIP LOCKED` so concurrent workers never share a
/// lease.
#[instrument(skip(pool, options))]
pub async fn lock_next_waiting_job(
    pool: &PgPool,
    worker_id: &str,
    now: DateTime<Utc>,
    options: &JobOptions,
) -> Result<Option<AnalysisJob>, QueueStorageError> {
    let client = pool.get().await?;
    let lock_expires_at = now + to_chrono(options.stall.lock_duration);

    let stmt = client
        .prepare(
            "UPDATE recruit.analysis_queue
SET
    state = 'active',
    locked_by = $1,
    lock_expires_at = $3,
    started_at = $2,
    updated_at = $2
WHERE id = (
    SELECT id
    FROM recruit.analysis_queue
    WHERE state IN ('waiting', 'delayed')
      AND (next_attempt_at IS NULL OR next_attempt_at <= $2)
    ORDER BY created_at, id
    LIMIT 1
    FOR UPDATE SKIP LOCKED
)
RETURNING *;",
        )
        .await?;

    let row = client
        .query_opt(&stmt, &[&worker_id, &now, &lock_expires_at])
        .await?;
    row.map(|r| row_to_job(&r)).transpose()
}

/// Extend the lease; a no-op unless the caller still holds it.
#[instrument(skip(pool, options))]
pub async fn renew_lease(
    pool: &PgPool,
    job_id: i64,
    worker_id: &str,
    now: DateTime<Utc>,
    options: &JobOptions,
) -> Result<bool, QueueStorageError> {
    let client = pool.get().await?;
    let lock_expires_at = now + to_chrono(options.stall.lock_duration);

    let rows = client
        .execute(
            "UPDATE recruit.analysis_queue
             SET lock_expires_at = $3, updated_at = $4
             WHERE id = $1 AND locked_by = $2 AND state = 'active'",
            &[&job_id, &worker_id, &lock_expires_at, &now],
        )
        .await?;
    Ok(rows == 1)
}

#[instrument(skip(pool))]
pub async fn complete_job(
    pool: &PgPool,
    job_id: i64,
    now: DateTime<Utc>,
) -> Result<u64, QueueStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE recruit.analysis_queue
             SET state = 'completed',
                 locked_by = NULL,
                 lock_expires_at = NULL,
                 completed_at = $2,
                 updated_at = $2
             WHERE id = $1 AND state = 'active'",
            &[&job_id, &now],
        )
        .await?;
    Ok(rows)
}

/// Record a failed attempt: delayed with the policy backoff while the budget
/// lasts, failed permanently after. Returns None when the job is not active
/// (e.g. a stall sweep already reclaimed it).
#[instrument(skip(pool, backoff, error))]
pub async fn fail_job_attempt(
    pool: &PgPool,
    job_id: i64,
    error: &str,
    now: DateTime<Utc>,
    backoff: &RetryPolicy,
) -> Result<Option<JobFailure>, QueueStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt(
            "SELECT attempts, max_attempts FROM recruit.analysis_queue
             WHERE id = $1 AND state = 'active'
             FOR UPDATE",
            &[&job_id],
        )
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let attempts: i32 = row.try_get::<_, i32>("attempts")? + 1;
    let max_attempts: i32 = row.try_get("max_attempts")?;

    let failure = if attempts >= max_attempts {
        tx.execute(
            "UPDATE recruit.analysis_queue
             SET state = 'failed',
                 attempts = $2,
                 last_error = $3,
                 locked_by = NULL,
                 lock_expires_at = NULL,
                 updated_at = $4
             WHERE id = $1",
            &[&job_id, &attempts, &error, &now],
        )
        .await?;
        JobFailure::Exhausted
    } else {
        let next_attempt_at = now + to_chrono(backoff.delay_for_attempt(attempts.max(0) as u32));
        tx.execute(
            "UPDATE recruit.analysis_queue
             SET state = 'delayed',
                 attempts = $2,
                 last_error = $3,
                 next_attempt_at = $4,
                 locked_by = NULL,
                 lock_expires_at = NULL,
                 started_at = NULL,
                 updated_at = $5
             WHERE id = $1",
            &[&job_id, &attempts, &error, &next_attempt_at, &now],
        )
        .await?;
        JobFailure::Retrying { next_attempt_at }
    };

    tx.commit().await?;
    Ok(Some(failure))
}

/// Reclaim active jobs whose lease expired: jobs at the stall budget fail
/// permanently, the rest go back to waiting for redelivery.
#[instrument(skip(pool, options))]
pub async fn recover_stalled_jobs(
    pool: &PgPool,
    now: DateTime<Utc>,
    options: &JobOptions,
) -> Result<StallSweep, QueueStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    let max_stalled = options.stall.max_stalled_count;

    let failed = tx
        .execute(
            "UPDATE recruit.analysis_queue
             SET state = 'failed',
                 last_error = 'job stalled too many times',
                 locked_by = NULL,
                 lock_expires_at = NULL,
                 updated_at = $1
             WHERE state = 'active'
               AND lock_expires_at <= $1
               AND stalled_count >= $2",
            &[&now, &max_stalled],
        )
        .await?;

    let redelivered = tx
        .execute(
            "UPDATE recruit.analysis_queue
             SET state = 'waiting',
                 stalled_count = stalled_count + 1,
                 locked_by = NULL,
                 lock_expires_at = NULL,
                 started_at = NULL,
                 updated_at = $1
             WHERE state = 'active'
               AND lock_expires_at <= $1",
            &[&now],
        )
        .await?;

    tx.commit().await?;
    Ok(StallSweep {
        redelivered,
        failed,
    })
}

#[instrument(skip(pool))]
pub async fn remove_failed_jobs(pool: &PgPool) -> Result<u64, QueueStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute("DELETE FROM recruit.analysis_queue WHERE state = 'failed'", &[])
        .await?;
    Ok(rows)
}

/// Bounded history: completed jobs older than the cutoff are dropped.
#[instrument(skip(pool))]
pub async fn purge_completed_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, QueueStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "DELETE FROM recruit.analysis_queue
             WHERE state = 'completed'
               AND COALESCE(completed_at, updated_at) < $1",
            &[&cutoff],
        )
        .await?;
    Ok(rows)
}

/// Waiting/delayed jobs, oldest first, for the referential-integrity sweep.
#[instrument(skip(pool))]
pub async fn list_pending_jobs(pool: &PgPool) -> Result<Vec<AnalysisJob>, QueueStorageError> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT * FROM recruit.analysis_queue
             WHERE state IN ('waiting', 'delayed')
             ORDER BY created_at, id",
            &[],
        )
        .await?;
    rows.iter().map(row_to_job).collect()
}

#[instrument(skip(pool))]
pub async fn remove_job(pool: &PgPool, job_id: i64) -> Result<u64, QueueStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute("DELETE FROM recruit.analysis_queue WHERE id = $1", &[&job_id])
        .await?;
    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn set_queue_paused(pool: &PgPool, paused: bool) -> Result<(), QueueStorageError> {
    let client = pool.get().await?;

    client
        .execute(
            "INSERT INTO recruit.queue_control (id, paused, updated_at)
             VALUES (1, $1, NOW())
             ON CONFLICT (id) DO UPDATE SET paused = EXCLUDED.paused, updated_at = NOW()",
            &[&paused],
        )
        .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn fetch_queue_paused(pool: &PgPool) -> Result<bool, QueueStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_opt("SELECT paused FROM recruit.queue_control WHERE id = 1", &[])
        .await?;
    Ok(row.map(|r| r.get("paused")).unwrap_or(false))
}

/// Referential integrity of a queued job's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceState {
    Valid,
    MissingApplication,
    MissingCandidate,
    MissingJob,
}

impl ReferenceState {
    pub fn is_valid(&self) -> bool {
        matches!(self, ReferenceState::Valid)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ReferenceState::Valid => "valid",
            ReferenceState::MissingApplication => "application no longer exists",
            ReferenceState::MissingCandidate => "candidate no longer exists",
            ReferenceState::MissingJob => "job posting no longer exists",
        }
    }
}

/// Resolve a job's application and, transitively, its candidate and job
/// posting. One query; missing links surface as the first broken hop.
#[instrument(skip(pool))]
pub async fn check_job_references(
    pool: &PgPool,
    application_id: i64,
) -> Result<ReferenceState, QueueStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            "SELECT c.id AS candidate_ref, j.id AS job_ref
             FROM recruit.applications a
             LEFT JOIN recruit.candidates c ON c.id = a.candidate_id
             LEFT JOIN recruit.jobs j ON j.id = a.job_id
             WHERE a.id = $1",
            &[&application_id],
        )
        .await?;

    let Some(row) = row else {
        return Ok(ReferenceState::MissingApplication);
    };

    if row.try_get::<_, Option<i64>>("candidate_ref")?.is_none() {
        return Ok(ReferenceState::MissingCandidate);
    }
    if row.try_get::<_, Option<i64>>("job_ref")?.is_none() {
        return Ok(ReferenceState::MissingJob);
    }
    Ok(ReferenceState::Valid)
}
