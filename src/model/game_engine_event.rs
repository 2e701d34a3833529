use std::time::Duration;

use super::{GamePhase, RoundResult, TimerStatus};

/// Everything the engine reports to the outside world. Emitted in a
/// fixed order per transition: `PhaseChanged` first, dependent updates
/// after.
#[derive(Debug, Clone)]
pub enum GameEngineEvent {
    PhaseChanged(GamePhase),
    CountdownTicked(u32),
    TimerUpdated {
        time_left: Duration,
        status: TimerStatus,
    },
    ClickCountUpdated(u32),
    RoundEnded(RoundResult),
}
