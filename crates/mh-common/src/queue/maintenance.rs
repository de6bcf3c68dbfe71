use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::api::models::queue::QueueCounts;
use crate::db::applications::ApplicationStorageError;
use crate::db::queue_stats::QueueStatsError;
use crate::db::{
    PgPool, QueueStorageError, check_job_references, fetch_queue_counts, list_pending_jobs,
    purge_completed_before, remove_failed_jobs, remove_job, reset_stuck_applications,
    set_queue_paused,
};

/// Aggregate counters from one cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub cleaned: u64,
    pub validated: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    #[error(transparent)]
    Queue(#[from] QueueStorageError),
    #[error(transparent)]
    Applications(#[from] ApplicationStorageError),
    #[error(transparent)]
    Stats(#[from] QueueStatsError),
}

const DEFAULT_COMPLETED_RETENTION_HOURS: i64 = 24;
const DEFAULT_STUCK_CUTOFF_HOURS: i64 = 1;

/// Self-healing sweep over the analysis queue and the applications it
/// references. Runs at boot, on a timer, and on demand through the API.
pub struct QueueMaintenance {
    pool: PgPool,
    completed_retention: Duration,
    stuck_cutoff: Duration,
}

impl QueueMaintenance {
    pub fn new(pool: PgPool) -> Self {
        Self::with_windows(
            pool,
            Duration::hours(DEFAULT_COMPLETED_RETENTION_HOURS),
            Duration::hours(DEFAULT_STUCK_CUTOFF_HOURS),
        )
    }

    pub fn with_windows(pool: PgPool, completed_retention: Duration, stuck_cutoff: Duration) -> Self {
        Self {
            pool,
            completed_retention,
            stuck_cutoff,
        }
    }

    /// Remove exhausted and orphaned jobs, trim old history, reset stuck
    /// applications. Per-item failures land in `errors`; one bad job never
    /// aborts the rest of the sweep.
    #[instrument(skip(self))]
    pub async fn cleanup_problematic_jobs(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let now = Utc::now();
        info!("starting queue cleanup");

        match remove_failed_jobs(&self.pool).await {
            Ok(removed) => {
                report.cleaned += removed;
                if removed > 0 {
                    info!(removed, "removed failed jobs");
                }
            }
            Err(err) => report
                .errors
                .push(format!("failed to remove failed jobs: {err}")),
        }

        match purge_completed_before(&self.pool, now - self.completed_retention).await {
            Ok(purged) if purged > 0 => info!(purged, "purged old completed jobs"),
            Ok(_) => {}
            Err(err) => report
                .errors
                .push(format!("failed to purge completed jobs: {err}")),
        }

        match list_pending_jobs(&self.pool).await {
            Ok(jobs) => {
                for job in jobs {
                    match check_job_references(&self.pool, job.application_id).await {
                        Ok(state) if state.is_valid() => report.validated += 1,
                        Ok(state) => match remove_job(&self.pool, job.id).await {
                            Ok(_) => {
                                report.cleaned += 1;
                                warn!(
                                    job_id = job.id,
                                    application_id = job.application_id,
                                    reason = state.describe(),
                                    "removed orphaned job"
                                );
                            }
                            Err(err) => report
                                .errors
                                .push(format!("failed to remove job {}: {err}", job.id)),
                        },
                        Err(err) => report
                            .errors
                            .push(format!("failed to validate job {}: {err}", job.id)),
                    }
                }
            }
            Err(err) => report
                .errors
                .push(format!("failed to list pending jobs: {err}")),
        }

        match reset_stuck_applications(&self.pool, now, self.stuck_cutoff).await {
            Ok(reset) if reset > 0 => info!(reset, "reset stuck applications"),
            Ok(_) => {}
            Err(err) => report
                .errors
                .push(format!("failed to reset stuck applications: {err}")),
        }

        info!(
            cleaned = report.cleaned,
            validated = report.validated,
            error_count = report.errors.len(),
            "queue cleanup finished"
        );
        report
    }

    pub async fn stats(&self) -> Result<QueueCounts, MaintenanceError> {
        Ok(fetch_queue_counts(&self.pool).await?)
    }

    pub async fn pause(&self) -> Result<(), MaintenanceError> {
        set_queue_paused(&self.pool, true).await?;
        info!("queue paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), MaintenanceError> {
        set_queue_paused(&self.pool, false).await?;
        info!("queue resumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_counters_and_errors() {
        let report = CleanupReport {
            cleaned: 3,
            validated: 7,
            errors: vec!["failed to remove job 9: gone".into()],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cleaned"], 3);
        assert_eq!(json["validated"], 7);
        assert_eq!(json["errors"][0], "failed to remove job 9: gone");
    }

    #[test]
    fn empty_report_is_all_zeroes() {
        let report = CleanupReport::default();
        assert_eq!(report.cleaned, 0);
        assert_eq!(report.validated, 0);
        assert!(report.errors.is_empty());
    }
}
