use std::{path::PathBuf, time::Duration};

use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
use clap::{Args, ValueEnum};

/// Knobs for a single round, shared by both variants.
#[derive(Debug, Clone, Args)]
pub struct RoundConfig {
    /// Amount taken from the balance on commit.
    #[arg(long, default_value_t = 10)]
    pub stake: u64,

    /// Countdown length in ticks.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub countdown: u32,

    /// Tick length in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    pub tick_ms: u64,

    /// Starting balance of a local round. Ignored against the ledger.
    #[arg(long, default_value_t = 100)]
    pub balance: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            stake: 10,
            countdown: 10,
            tick_ms: 1_000,
            balance: 100,
        }
    }
}

impl RoundConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// How to reach the lotto program.
#[derive(Debug, Clone, Args)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint, or a cluster name such as `devnet`.
    #[arg(long, env = "LOTTO_RPC_URL", default_value = "http://127.0.0.1:8899")]
    pub rpc_url: String,

    /// Keypair file of the signing account.
    #[arg(long, env = "LOTTO_KEYPAIR")]
    pub keypair: PathBuf,

    /// Balance refresh interval in milliseconds.
    #[arg(long, default_value_t = 15_000)]
    pub poll_ms: u64,

    #[arg(long, value_enum, default_value_t = Commitment::Confirmed)]
    pub commitment: Commitment,

    /// Signature status poll interval in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub confirm_poll_ms: u64,

    /// Give up on an unconfirmed transaction after this many seconds.
    #[arg(long, default_value_t = 60)]
    pub confirm_timeout_secs: u64,
}

impl LedgerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn confirm_poll(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms.max(1))
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}
