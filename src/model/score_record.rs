/// One ledger entry: a submitted score and the ledger timestamp (unix
/// seconds) it was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRecord {
    pub score: u32,
    pub timestamp: u64,
}
