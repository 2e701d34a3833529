pub mod game_engine;
pub mod session;
pub mod settings;
pub mod stats_store;

pub use game_engine::GameEngine;
pub use session::GameSession;
pub use settings::Settings;
pub use stats_store::StatsStore;
