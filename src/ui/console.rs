use std::cell::Cell;
use std::time::Duration;

use log::debug;

use super::presenter::{Presenter, StatsSource};
use crate::model::{GamePhase, PlayerStats, RoundResult, TimerStatus};

/// Terminal renderer for the demo binary. Timer updates arrive many
/// times per second, so only whole-second boundaries are printed.
pub struct ConsolePresenter {
    last_printed_second: Cell<Option<u64>>,
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self {
            last_printed_second: Cell::new(None),
        }
    }

    fn status_marker(status: TimerStatus) -> &'static str {
        match status {
            TimerStatus::Normal => " ",
            TimerStatus::Warning => "!",
            TimerStatus::Danger => "!!",
        }
    }
}

impl Presenter for ConsolePresenter {
    fn phase_changed(&self, phase: GamePhase) {
        println!("== {}", phase.label());
        if phase == GamePhase::Playing {
            self.last_printed_second.set(None);
        }
    }

    fn countdown_ticked(&self, value: u32) {
        println!("   {}...", value);
    }

    fn timer_updated(&self, time_left: Duration, status: TimerStatus) {
        let second = time_left.as_secs();
        if self.last_printed_second.get() == Some(second) && !time_left.is_zero() {
            return;
        }
        self.last_printed_second.set(Some(second));
        println!(
            "   {:>4.1}s left {}",
            time_left.as_secs_f64(),
            Self::status_marker(status)
        );
    }

    fn click_count_updated(&self, count: u32) {
        debug!(target: "console", "clicks: {}", count);
    }

    fn round_ended(&self, result: &RoundResult) {
        println!(
            "   round over: {} clicks in {:.1}s ({:.2} clicks/s)",
            result.score,
            result.duration.as_secs_f64(),
            result.clicks_per_second()
        );
    }

    fn stats_updated(&self, stats: &PlayerStats, source: StatsSource) {
        let label = match source {
            StatsSource::Ledger => "ledger",
            StatsSource::Local => "local",
        };
        println!(
            "   [{}] games: {}  best: {}  total clicks: {}",
            label, stats.games_played, stats.best_score, stats.total_clicks
        );
    }

    fn wallet_connected(&self, address: &str) {
        println!("   connected as {}", address);
    }

    fn alert(&self, message: &str) {
        println!(" ! {}", message);
    }

    fn set_start_enabled(&self, enabled: bool) {
        debug!(target: "console", "start control enabled: {}", enabled);
    }

    fn reset_display(&self) {
        self.last_printed_second.set(None);
        println!();
    }
}
