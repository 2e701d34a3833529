use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed configuration, read once at startup. Durations are stored as
/// milliseconds so the settings file stays flat.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default = "default_round_duration_ms")]
    pub round_duration_ms: u64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_warning_threshold_ms")]
    pub warning_threshold_ms: u64,

    #[serde(default = "default_danger_threshold_ms")]
    pub danger_threshold_ms: u64,

    #[serde(default = "default_countdown_start")]
    pub countdown_start: u32,

    #[serde(default = "default_min_score")]
    pub min_score: u32,

    #[serde(default = "default_max_score")]
    pub max_score: u32,

    #[serde(default = "default_alert_duration_ms")]
    pub alert_duration_ms: u64,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

// Helper functions for default values
fn default_version() -> u32 {
    1
}
fn default_round_duration_ms() -> u64 {
    10_000
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_warning_threshold_ms() -> u64 {
    5_000
}
fn default_danger_threshold_ms() -> u64 {
    2_000
}
fn default_countdown_start() -> u32 {
    3
}
fn default_min_score() -> u32 {
    1
}
fn default_max_score() -> u32 {
    1_000
}
fn default_alert_duration_ms() -> u64 {
    4_000
}
fn default_chain_id() -> u64 {
    31_337
}
fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            round_duration_ms: default_round_duration_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            warning_threshold_ms: default_warning_threshold_ms(),
            danger_threshold_ms: default_danger_threshold_ms(),
            countdown_start: default_countdown_start(),
            min_score: default_min_score(),
            max_score: default_max_score(),
            alert_duration_ms: default_alert_duration_ms(),
            chain_id: default_chain_id(),
            rpc_url: default_rpc_url(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::settings_path();
        if let Ok(contents) = fs::read_to_string(&path) {
            if let Ok(mut settings) = serde_json::from_str::<Settings>(&contents) {
                settings.migrate();
                settings.apply_env_overrides();
                settings.sanitize();
                return settings;
            }
        }
        let mut default = Settings::default();
        let _ = default.save();
        default.apply_env_overrides();
        default
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        let path = Self::settings_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string(self)?;
        fs::write(path, contents)
    }

    /// Data directory for the settings file and the fallback store.
    pub fn data_dir() -> PathBuf {
        env::var("CLICKRUSH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".clickrush"))
    }

    fn settings_path() -> PathBuf {
        Self::data_dir().join("settings.json")
    }

    fn migrate(&mut self) {
        match self.version {
            0 => {
                self.version = 1;
            }
            _ => (),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("CLICKRUSH_RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(chain_id) = env::var("CLICKRUSH_CHAIN_ID")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.chain_id = chain_id;
        }
    }

    /// Keeps hand-edited files inside the invariants the engine assumes:
    /// danger <= warning <= round duration, a nonzero tick, min <= max.
    fn sanitize(&mut self) {
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.warning_threshold_ms = self.warning_threshold_ms.min(self.round_duration_ms);
        self.danger_threshold_ms = self.danger_threshold_ms.min(self.warning_threshold_ms);
        self.max_score = self.max_score.max(self.min_score);
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_millis(self.round_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn warning_threshold(&self) -> Duration {
        Duration::from_millis(self.warning_threshold_ms)
    }

    pub fn danger_threshold(&self) -> Duration {
        Duration::from_millis(self.danger_threshold_ms)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }
}
