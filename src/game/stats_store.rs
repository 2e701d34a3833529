use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::model::PlayerStats;

/// Local fallback persistence: one JSON file of aggregate stats,
/// used when no ledger is reachable ("demo mode").
#[derive(Debug)]
pub struct StatsStore {
    data_dir: PathBuf,
}

impl StatsStore {
    pub fn new(data_dir: PathBuf) -> Self {
        if !data_dir.exists() {
            let _ = fs::create_dir_all(&data_dir);
        }
        Self { data_dir }
    }

    fn stats_path(&self) -> PathBuf {
        self.data_dir.join("player_stats.json")
    }

    /// Missing or unparsable files read as zeroed stats.
    pub fn load(&self) -> PlayerStats {
        if let Ok(contents) = fs::read_to_string(self.stats_path()) {
            match serde_json::from_str(&contents) {
                Ok(stats) => return stats,
                Err(error) => {
                    warn!(target: "stats_store", "Discarding unparsable stats file: {}", error);
                }
            }
        }
        PlayerStats::default()
    }

    pub fn save(&self, stats: &PlayerStats) -> std::io::Result<()> {
        let contents = serde_json::to_string_pretty(stats)?;
        fs::write(self.stats_path(), contents)
    }
}
