use std::time::Duration;

/// Display urgency derived from the remaining time. Always recomputed
/// from the thresholds, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Normal,
    Warning,
    Danger,
}

/// Remaining time for one round. `advance` saturates, so `time_left`
/// lands on exactly zero and never goes negative.
#[derive(Debug, Clone)]
pub struct RoundClock {
    time_left: Duration,
    duration_total: Duration,
    warning_at: Duration,
    danger_at: Duration,
}

impl RoundClock {
    pub fn new(duration_total: Duration, warning_at: Duration, danger_at: Duration) -> Self {
        Self {
            time_left: duration_total,
            duration_total,
            warning_at,
            danger_at,
        }
    }

    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn duration_total(&self) -> Duration {
        self.duration_total
    }

    pub fn advance(&mut self, step: Duration) {
        self.time_left = self.time_left.saturating_sub(step);
    }

    pub fn expired(&self) -> bool {
        self.time_left.is_zero()
    }

    pub fn expire(&mut self) {
        self.time_left = Duration::ZERO;
    }

    pub fn reset(&mut self) {
        self.time_left = self.duration_total;
    }

    pub fn status(&self) -> TimerStatus {
        if self.time_left <= self.danger_at {
            TimerStatus::Danger
        } else if self.time_left <= self.warning_at {
            TimerStatus::Warning
        } else {
            TimerStatus::Normal
        }
    }
}
