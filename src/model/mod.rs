mod game_engine_command;
mod game_engine_event;
mod game_phase;
mod player_stats;
mod round_clock;
mod round_result;
mod score_record;

pub use game_engine_command::GameEngineCommand;
pub use game_engine_event::GameEngineEvent;
pub use game_phase::GamePhase;
pub use player_stats::PlayerStats;
pub use round_clock::{RoundClock, TimerStatus};
pub use round_result::RoundResult;
pub use score_record::ScoreRecord;
