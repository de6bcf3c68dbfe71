use serde::{Deserialize, Serialize};

/// Jobs per queue state, as reported by the stats endpoint and the
/// maintenance service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub waiting: i64,
    pub delayed: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

impl QueueCounts {
    pub fn total(&self) -> i64 {
        self.waiting + self.delayed + self.active + self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_all_states() {
        let counts = QueueCounts {
            waiting: 1,
            delayed: 2,
            active: 3,
            completed: 4,
            failed: 5,
        };
        assert_eq!(counts.total(), 15);
    }

    #[test]
    fn serializes_with_state_names() {
        let json = serde_json::to_value(QueueCounts::default()).unwrap();
        assert_eq!(json["waiting"], 0);
        assert_eq!(json["failed"], 0);
    }
}
