use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::UNIX_EPOCH;

use log::debug;

use crate::clock::TimeSource;
use crate::events::{Channel, EventEmitter, EventObserver};
use crate::model::{PlayerStats, ScoreRecord};

pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    ScoreOutOfRange(u32),
    IndexOutOfRange { index: u32, count: u32 },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::ScoreOutOfRange(score) => {
                write!(f, "score {} is outside {}..={}", score, MIN_SCORE, MAX_SCORE)
            }
            ContractError::IndexOutOfRange { index, count } => {
                write!(f, "score index {} out of range (count {})", index, count)
            }
        }
    }
}

impl std::error::Error for ContractError {}

/// Published once per accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmitted {
    pub player: String,
    pub score: u32,
    pub timestamp: u64,
}

/// In-memory, append-only per-player score ledger with aggregate
/// counters: the reference backend for the contract surface any real
/// ledger must satisfy. Scores are recorded with the ledger timestamp
/// and are never rewritten.
pub struct ScoreLedger {
    scores: HashMap<String, Vec<ScoreRecord>>,
    stats: HashMap<String, PlayerStats>,
    time_source: Rc<dyn TimeSource>,
    event_emitter: EventEmitter<ScoreSubmitted>,
    event_observer: EventObserver<ScoreSubmitted>,
}

impl ScoreLedger {
    pub fn new(time_source: Rc<dyn TimeSource>) -> Self {
        let (event_emitter, event_observer) = Channel::new();
        Self {
            scores: HashMap::new(),
            stats: HashMap::new(),
            time_source,
            event_emitter,
            event_observer,
        }
    }

    /// Subscription point for submission events (indexers, tests).
    pub fn events(&self) -> EventObserver<ScoreSubmitted> {
        self.event_observer.clone()
    }

    /// Records one score for `caller`. Errors unless
    /// `MIN_SCORE <= clicks <= MAX_SCORE`.
    pub fn submit_score(&mut self, caller: &str, clicks: u32) -> Result<(), ContractError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&clicks) {
            return Err(ContractError::ScoreOutOfRange(clicks));
        }
        let timestamp = self
            .time_source
            .now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.scores
            .entry(caller.to_string())
            .or_default()
            .push(ScoreRecord {
                score: clicks,
                timestamp,
            });
        self.stats
            .entry(caller.to_string())
            .or_default()
            .record_score(clicks);
        debug!(target: "ledger", "Recorded {} clicks for {}", clicks, caller);
        self.event_emitter.emit(&ScoreSubmitted {
            player: caller.to_string(),
            score: clicks,
            timestamp,
        });
        Ok(())
    }

    pub fn player_scores(&self, player: &str) -> Vec<u32> {
        self.scores
            .get(player)
            .map(|records| records.iter().map(|record| record.score).collect())
            .unwrap_or_default()
    }

    /// Unknown players read as zeroed stats.
    pub fn player_stats(&self, player: &str) -> PlayerStats {
        self.stats.get(player).cloned().unwrap_or_default()
    }

    pub fn score_at(&self, player: &str, index: u32) -> Result<ScoreRecord, ContractError> {
        let count = self.score_count(player);
        self.scores
            .get(player)
            .and_then(|records| records.get(index as usize))
            .copied()
            .ok_or(ContractError::IndexOutOfRange { index, count })
    }

    pub fn score_count(&self, player: &str) -> u32 {
        self.scores
            .get(player)
            .map(|records| records.len() as u32)
            .unwrap_or(0)
    }
}
