pub mod events;
pub mod job;
pub mod maintenance;

pub use events::{QueueEvent, QueueEvents, log_queue_event};
pub use job::{
    AnalysisJob, AnalysisQueue, JobFailure, JobOptions, JobState, RateLimitWindow, StallSettings,
    StallSweep,
};
pub use maintenance::{CleanupReport, MaintenanceError, QueueMaintenance};
