use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::models::queue::QueueCounts;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Delayed,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Delayed => "delayed",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// States from which a job can still be leased.
    pub fn is_ready(&self) -> bool {
        matches!(self, JobState::Waiting | JobState::Delayed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Dispatch window for the worker pool: at most `max_jobs` leases per
/// `window`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitWindow {
    pub max_jobs: u32,
    pub window: Duration,
}

/// Lease bookkeeping knobs. A lease not renewed before `lock_duration`
/// elapses makes the job stalled; `max_stalled_count` stalls turn it into a
/// permanent failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallSettings {
    pub lock_duration: Duration,
    pub lock_renew_interval: Duration,
    pub stalled_interval: Duration,
    pub max_stalled_count: i32,
}

/// Per-queue configuration. Values mirror the production defaults but are
/// plain data, overridable per deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobOptions {
    pub max_attempts: i32,
    pub backoff: RetryPolicy,
    pub timeout: Duration,
    pub limiter: RateLimitWindow,
    pub stall: StallSettings,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: RetryPolicy::queue_default(),
            timeout: Duration::from_secs(300),
            limiter: RateLimitWindow {
                max_jobs: 5,
                window: Duration::from_secs(5),
            },
            stall: StallSettings {
                lock_duration: Duration::from_secs(30),
                lock_renew_interval: Duration::from_secs(15),
                stalled_interval: Duration::from_secs(10),
                max_stalled_count: 2,
            },
        }
    }
}

/// One queue entry referencing an application by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: i64,
    pub application_id: i64,
    pub state: JobState,
    pub attempts: i32,
    pub max_attempts: i32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub stalled_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn new(application_id: i64, options: &JobOptions, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            application_id,
            state: JobState::Waiting,
            attempts: 0,
            max_attempts: options.max_attempts,
            next_attempt_at: None,
            locked_by: None,
            lock_expires_at: None,
            stalled_count: 0,
            last_error: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }
}

/// Outcome of a failed handler attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JobFailure {
    Retrying { next_attempt_at: DateTime<Utc> },
    Exhausted,
}

/// Tally of one stall-recovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StallSweep {
    pub redelivered: u64,
    pub failed: u64,
}

pub(crate) fn to_chrono(duration: Duration) -> chrono::Duration {
    // Config durations are small; saturate rather than panic on nonsense.
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365))
}

/// In-memory queue with the same lifecycle semantics as the persisted
/// `recruit.analysis_queue`. The Postgres store is authoritative in
/// production; this model backs unit tests and documents the transitions.
#[derive(Debug, Default)]
pub struct AnalysisQueue {
    pub jobs: Vec<AnalysisJob>,
    pub options: JobOptions,
    paused: bool,
    next_id: i64,
}

impl AnalysisQueue {
    pub fn with_options(options: JobOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Enqueue an analysis job unless one is already in flight for the same
    /// application. Returns the job id.
    pub fn enqueue(&mut self, application_id: i64, now: DateTime<Utc>) -> Option<i64> {
        let in_flight = self.jobs.iter().any(|job| {
            job.application_id == application_id && !job.state.is_terminal()
        });
        if in_flight {
            return None;
        }

        self.next_id += 1;
        let mut job = AnalysisJob::new(application_id, &self.options, now);
        job.id = self.next_id;
        self.jobs.push(job);
        Some(self.next_id)
    }

    /// Lease the oldest due job for `worker_id`. None while paused or empty.
    pub fn lease_next(&mut self, worker_id: &str, now: DateTime<Utc>) -> Option<AnalysisJob> {
        if self.paused {
            return None;
        }

        let idx = self
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| {
                job.state.is_ready()
                    && job.next_attempt_at.map(|ts| ts <= now).unwrap_or(true)
            })
            .min_by_key(|(_, job)| (job.created_at, job.id))
            .map(|(idx, _)| idx)?;

        let job = &mut self.jobs[idx];
        job.state = JobState::Active;
        job.locked_by = Some(worker_id.to_string());
        job.lock_expires_at = Some(now + to_chrono(self.options.stall.lock_duration));
        job.started_at = Some(now);
        job.updated_at = now;
        Some(job.clone())
    }

    /// Extend the lease while the caller still holds it.
    pub fn renew_lease(&mut self, id: i64, worker_id: &str, now: DateTime<Utc>) -> bool {
        let lock_duration = to_chrono(self.options.stall.lock_duration);
        self.jobs
            .iter_mut()
            .find(|job| {
                job.id == id
                    && job.state == JobState::Active
                    && job.locked_by.as_deref() == Some(worker_id)
            })
            .map(|job| {
                job.lock_expires_at = Some(now + lock_duration);
                job.updated_at = now;
                true
            })
            .unwrap_or(false)
    }

    pub fn complete(&mut self, id: i64, now: DateTime<Utc>) -> bool {
        self.jobs
            .iter_mut()
            .find(|job| job.id == id && job.state == JobState::Active)
            .map(|job| {
                job.state = JobState::Completed;
                job.locked_by = None;
                job.lock_expires_at = None;
                job.completed_at = Some(now);
                job.updated_at = now;
                true
            })
            .unwrap_or(false)
    }

    /// Record a failed attempt: delayed with backoff while the attempt budget
    /// lasts, failed permanently after.
    pub fn fail_attempt(&mut self, id: i64, error: &str, now: DateTime<Utc>) -> Option<JobFailure> {
        let backoff = self.options.backoff;
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id == id && job.state == JobState::Active)?;

        job.attempts += 1;
        job.last_error = Some(error.to_string());
        job.locked_by = None;
        job.lock_expires_at = None;
        job.updated_at = now;

        if job.attempts >= job.max_attempts {
            job.state = JobState::Failed;
            return Some(JobFailure::Exhausted);
        }

        let next_attempt_at =
            now + to_chrono(backoff.delay_for_attempt(job.attempts.max(0) as u32));
        job.state = JobState::Delayed;
        job.started_at = None;
        job.next_attempt_at = Some(next_attempt_at);
        Some(JobFailure::Retrying { next_attempt_at })
    }

    /// Redeliver active jobs whose lease expired; jobs already at the stall
    /// budget fail permanently instead.
    pub fn recover_stalled(&mut self, now: DateTime<Utc>) -> StallSweep {
        let max_stalled = self.options.stall.max_stalled_count;
        let mut sweep = StallSweep::default();

        for job in self.jobs.iter_mut() {
            let expired = job.state == JobState::Active
                && job.lock_expires_at.map(|ts| ts <= now).unwrap_or(false);
            if !expired {
                continue;
            }

            job.locked_by = None;
            job.lock_expires_at = None;
            job.updated_at = now;

            if job.stalled_count >= max_stalled {
                job.state = JobState::Failed;
                job.last_error = Some("job stalled too many times".into());
                sweep.failed += 1;
            } else {
                job.stalled_count += 1;
                job.state = JobState::Waiting;
                job.started_at = None;
                sweep.redelivered += 1;
            }
        }

        sweep
    }

    pub fn remove_failed(&mut self) -> u64 {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.state != JobState::Failed);
        (before - self.jobs.len()) as u64
    }

    pub fn purge_completed_before(&mut self, cutoff: DateTime<Utc>) -> u64 {
        let before = self.jobs.len();
        self.jobs.retain(|job| {
            !(job.state == JobState::Completed
                && job.completed_at.map(|ts| ts < cutoff).unwrap_or(true))
        });
        (before - self.jobs.len()) as u64
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.id != id);
        before != self.jobs.len()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for job in &self.jobs {
            match job.state {
                JobState::Waiting => counts.waiting += 1,
                JobState::Delayed => counts.delayed += 1,
                JobState::Active => counts.active += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
