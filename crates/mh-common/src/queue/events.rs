use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Typed queue lifecycle events. Observability only; nothing in the pipeline
/// branches on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    Waiting { job_id: i64 },
    Active { job_id: i64 },
    Completed { job_id: i64 },
    Failed { job_id: i64, reason: String },
    Progress { job_id: i64, percent: u8 },
    Stalled { job_id: i64 },
    QueueError { message: String },
}

/// Broadcast fan-out for queue events. Publishing never blocks and never
/// fails: with no subscriber the event is simply dropped.
#[derive(Debug, Clone)]
pub struct QueueEvents {
    tx: broadcast::Sender<QueueEvent>,
}

impl QueueEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: QueueEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }
}

impl Default for QueueEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Standard log line per event, used by the worker's observer task.
pub fn log_queue_event(event: &QueueEvent) {
    match event {
        QueueEvent::Waiting { job_id } => info!(job_id, "job waiting"),
        QueueEvent::Active { job_id } => info!(job_id, "job active"),
        QueueEvent::Completed { job_id } => info!(job_id, "job completed"),
        QueueEvent::Failed { job_id, reason } => {
            error!(job_id, reason = %reason, "job failed")
        }
        QueueEvent::Progress { job_id, percent } => {
            info!(job_id, percent, "job progress")
        }
        QueueEvent::Stalled { job_id } => warn!(job_id, "job stalled; will be redelivered"),
        QueueEvent::QueueError { message } => error!(message = %message, "queue error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let events = QueueEvents::new(8);
        let mut rx = events.subscribe();

        events.publish(QueueEvent::Active { job_id: 3 });
        events.publish(QueueEvent::Completed { job_id: 3 });

        assert_eq!(rx.recv().await.unwrap(), QueueEvent::Active { job_id: 3 });
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::Completed { job_id: 3 });
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let events = QueueEvents::new(8);
        events.publish(QueueEvent::QueueError {
            message: "dropped".into(),
        });
    }

    #[test]
    fn log_queue_event_covers_every_variant() {
        for event in [
            QueueEvent::Waiting { job_id: 1 },
            QueueEvent::Active { job_id: 1 },
            QueueEvent::Completed { job_id: 1 },
            QueueEvent::Failed {
                job_id: 1,
                reason: "boom".into(),
            },
            QueueEvent::Progress {
                job_id: 1,
                percent: 50,
            },
            QueueEvent::Stalled { job_id: 1 },
            QueueEvent::QueueError {
                message: "boom".into(),
            },
        ] {
            log_queue_event(&event);
        }
    }
}
