use std::time::{Duration, SystemTime};

use serde_with::serde_as;
use serde_with::TimestampSeconds;
use uuid::Uuid;

/// Outcome of one completed round. Built once at the Finished
/// transition and handed to the orchestrator; never mutated after.
#[serde_as]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundResult {
    pub round_id: Uuid,
    pub score: u32,
    pub duration: Duration,
    #[serde_as(as = "TimestampSeconds")]
    pub timestamp: SystemTime,
}

impl RoundResult {
    pub fn clicks_per_second(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.score as f64 / self.duration.as_secs_f64()
    }
}
