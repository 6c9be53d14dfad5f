//! Everything that talks to the ledger: the [`Ledger`] seam, the settlement
//! adapter the game drives, the balance poller and the JSON-RPC binding.

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;

use crate::{error::LedgerError, PICK_COUNT};

pub use poller::BalancePoller;
pub use rpc::RpcLedger;
pub use settlement::LedgerSettlement;

pub mod poller;
pub mod rpc;
pub mod settlement;

#[cfg(test)]
pub(crate) mod fake;

/// A submitted transaction that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    id: String,
}

impl PendingTx {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Transaction signature as the ledger reports it.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The contract surface the round needs from the ledger. All writes go
/// through here; nothing ledger-owned is ever mutated locally.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The account this connection signs for.
    fn account(&self) -> Pubkey;

    async fn owner(&self) -> Result<Pubkey, LedgerError>;

    async fn has_entered(&self, player: &Pubkey) -> Result<bool, LedgerError>;

    /// Cost of an entry, in the ledger's own units, without submitting it.
    async fn estimate_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<u64, LedgerError>;

    async fn submit_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<PendingTx, LedgerError>;

    async fn submit_reset(&self) -> Result<PendingTx, LedgerError>;

    /// Resolves once `tx` is confirmed, or fails if it was rejected or
    /// could not be confirmed.
    async fn wait(&self, tx: &PendingTx) -> Result<(), LedgerError>;

    async fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError>;
}
