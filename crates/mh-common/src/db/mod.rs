pub mod analysis_queue;
pub mod applications;
pub mod candidates;
pub mod jobs;
pub mod migrations;
pub mod pool;
pub mod queue_stats;
pub mod schema;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use analysis_queue::{
    QueueStorageError, ReferenceState, check_job_references, complete_job, enqueue_analysis_job,
    fail_job_attempt, fetch_queue_paused, list_pending_jobs, lock_next_waiting_job,
    purge_completed_before, recover_stalled_jobs, remove_failed_jobs, remove_job, renew_lease,
    set_queue_paused,
};
pub use applications::{
    ApplicationRecord, ApplicationStatus, ApplicationStorageError, STUCK_RESET_NOTE,
    create_application, fetch_application, is_stuck, mark_analysis_failed, mark_analyzing,
    reset_stuck_applications, save_analysis_outcome,
};
pub use candidates::{CandidateFetchError, fetch_candidate};
pub use jobs::{JobFetchError, fetch_job};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use queue_stats::{QueueStatsError, fetch_queue_counts};
