use thiserror::Error;

/// Transport and contract failures reported by a ledger connection.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("rpc request failed: {0}")]
    Rpc(String),

    #[error(transparent)]
    Client(#[from] anchor_client::ClientError),

    #[error("could not read keypair {path}: {detail}")]
    Keypair { path: String, detail: String },

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("transaction {signature} failed: {detail}")]
    Rejected { signature: String, detail: String },

    #[error("transaction {0} was not confirmed in time")]
    Timeout(String),
}

/// Failures a player sees. Every one of them leaves the round in a well
/// defined state; none is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundFailure {
    #[error("You have already entered the lottery.")]
    AlreadyEntered,

    #[error("Could not check your entry status: {0}")]
    EntryCheck(String),

    #[error("Failed to estimate the entry cost: {0}")]
    Estimate(String),

    #[error("Failed to submit the entry: {0}")]
    Submission(String),

    #[error("Transaction failed or was rejected.")]
    Confirmation,

    #[error("Only the contract owner can reset the lottery.")]
    NotOwner,
}
