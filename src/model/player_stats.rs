use serde::{Deserialize, Serialize};

/// Aggregate per-player record. Lives in whichever store is active
/// (ledger or local fallback) and outlives any single round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub total_clicks: u64,
}

impl PlayerStats {
    /// Folds one finished round in. Counters only ever grow; the best
    /// score only moves up.
    pub fn record_score(&mut self, score: u32) {
        self.games_played += 1;
        self.total_clicks += score as u64;
        if score > self.best_score {
            self.best_score = score;
        }
    }
}
