use std::fmt;

use crate::model::PlayerStats;

/// Uniform boundary error for wallet/ledger collaborators. Whatever a
/// transport fails with is converted to one of these at the boundary;
/// nothing collaborator-native crosses into the game layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    WalletUnavailable,
    NotConnected,
    WrongNetwork { expected: u64, actual: u64 },
    Rejected(String),
    Transport(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::WalletUnavailable => write!(f, "no wallet is available"),
            LedgerError::NotConnected => write!(f, "wallet is not connected"),
            LedgerError::WrongNetwork { expected, actual } => {
                write!(f, "wallet is on chain {}, expected chain {}", actual, expected)
            }
            LedgerError::Rejected(reason) => {
                write!(f, "ledger rejected the transaction: {}", reason)
            }
            LedgerError::Transport(reason) => write!(f, "ledger request failed: {}", reason),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Wallet-plus-ledger collaborator the orchestrator talks to. Calls are
/// synchronous at this seam; the transport behind an implementation
/// owns its own timeout behavior.
pub trait WalletLedgerClient {
    fn is_available(&self) -> bool;

    /// Connects and returns the player address.
    fn connect(&self) -> Result<String, LedgerError>;

    fn is_connected(&self) -> bool;

    /// Submits a finished round's score; returns a transaction id.
    fn submit_score(&self, score: u32) -> Result<String, LedgerError>;

    /// Reads aggregate stats, for `address` or for the connected player
    /// when `None`. Always a full re-read, never a cached view.
    fn player_stats(&self, address: Option<&str>) -> Result<PlayerStats, LedgerError>;
}
