use std::cell::{Cell, RefCell};
use std::rc::Rc;

use itertools::Itertools;
use log::info;
use rand::Rng;

use super::client::{LedgerError, WalletLedgerClient};
use super::contract::ScoreLedger;
use crate::model::PlayerStats;

/// Chain identity a client is configured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkId {
    pub chain_id: u64,
    pub rpc_url: String,
}

/// Wallet client over an in-process [`ScoreLedger`], the demo-mode
/// chain. Carries the availability/connection/network state a browser
/// wallet would, so the orchestrator exercises the same paths either
/// way.
pub struct MemoryWalletClient {
    ledger: Rc<RefCell<ScoreLedger>>,
    network: NetworkId,
    wallet_chain: Cell<u64>,
    available: Cell<bool>,
    connected: Cell<bool>,
    address: String,
}

impl MemoryWalletClient {
    pub fn new(ledger: Rc<RefCell<ScoreLedger>>, network: NetworkId) -> Self {
        let address = format!("0x{}", random_hex(20));
        Self {
            ledger,
            wallet_chain: Cell::new(network.chain_id),
            network,
            available: Cell::new(true),
            connected: Cell::new(false),
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Simulates the wallet extension disappearing or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Simulates the user switching the wallet to another chain.
    pub fn set_wallet_chain(&self, chain_id: u64) {
        self.wallet_chain.set(chain_id);
    }
}

impl WalletLedgerClient for MemoryWalletClient {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn connect(&self) -> Result<String, LedgerError> {
        if !self.available.get() {
            return Err(LedgerError::WalletUnavailable);
        }
        if self.wallet_chain.get() != self.network.chain_id {
            // the network-switch request a real wallet would prompt for
            info!(
                target: "ledger",
                "Switching wallet from chain {} to chain {} ({})",
                self.wallet_chain.get(),
                self.network.chain_id,
                self.network.rpc_url
            );
            self.wallet_chain.set(self.network.chain_id);
        }
        self.connected.set(true);
        Ok(self.address.clone())
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn submit_score(&self, score: u32) -> Result<String, LedgerError> {
        if !self.available.get() {
            return Err(LedgerError::WalletUnavailable);
        }
        if !self.connected.get() {
            return Err(LedgerError::NotConnected);
        }
        if self.wallet_chain.get() != self.network.chain_id {
            return Err(LedgerError::WrongNetwork {
                expected: self.network.chain_id,
                actual: self.wallet_chain.get(),
            });
        }
        self.ledger
            .borrow_mut()
            .submit_score(&self.address, score)
            .map_err(|error| LedgerError::Rejected(error.to_string()))?;
        Ok(format!("0x{}", random_hex(16)))
    }

    fn player_stats(&self, address: Option<&str>) -> Result<PlayerStats, LedgerError> {
        if address.is_none() && !self.connected.get() {
            return Err(LedgerError::NotConnected);
        }
        let address = address.unwrap_or(&self.address);
        Ok(self.ledger.borrow().player_stats(address))
    }
}

fn random_hex(n_bytes: usize) -> String {
    let mut rng = rand::rng();
    (0..n_bytes).map(|_| format!("{:02x}", rng.random::<u8>())).join("")
}
