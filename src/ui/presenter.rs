use std::time::Duration;

use crate::model::{GamePhase, PlayerStats, RoundResult, TimerStatus};

/// Which store the presented stats came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Ledger,
    Local,
}

/// Presentation boundary. The session pushes every observable change
/// through here; an implementation renders however it likes (console,
/// GUI, web view). Methods take `&self` so renderers manage their own
/// interior state.
pub trait Presenter {
    fn phase_changed(&self, phase: GamePhase);
    fn countdown_ticked(&self, value: u32);
    fn timer_updated(&self, time_left: Duration, status: TimerStatus);
    fn click_count_updated(&self, count: u32);
    fn round_ended(&self, result: &RoundResult);
    fn stats_updated(&self, stats: &PlayerStats, source: StatsSource);
    fn wallet_connected(&self, address: &str);
    fn alert(&self, message: &str);
    fn set_start_enabled(&self, enabled: bool);
    fn reset_display(&self);
}
