mod client;
mod contract;
mod memory_client;

pub use client::{LedgerError, WalletLedgerClient};
pub use contract::{ContractError, ScoreLedger, ScoreSubmitted, MAX_SCORE, MIN_SCORE};
pub use memory_client::{MemoryWalletClient, NetworkId};
