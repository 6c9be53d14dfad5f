use std::{future::Future, sync::Arc, time::Duration};

use anchor_client::{
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::{
        commitment_config::CommitmentConfig,
        signature::{read_keypair_file, Keypair, Signature, Signer},
        transaction::Transaction,
    },
    Client, Cluster, Program,
};
use anchor_lang::{
    prelude::Pubkey, solana_program::instruction::Instruction, system_program, InstructionData,
    ToAccountMetas,
};
use async_trait::async_trait;
use lotto_program::state::{Config, Entry, Treasury};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use super::{Ledger, PendingTx};
use crate::{config::LedgerConfig, error::LedgerError, PICK_COUNT};

/// [`Ledger`] backed by the lotto program on a Solana JSON-RPC node.
pub struct RpcLedger {
    program: Program<Arc<Keypair>>,
    rpc: RpcClient,
    payer: Arc<Keypair>,
    commitment: CommitmentConfig,
    confirm_poll: Duration,
    confirm_timeout: Duration,
}

fn rpc_error(err: impl ToString) -> LedgerError {
    LedgerError::Rpc(err.to_string())
}

/// A signature's status as the node reports it; `None` while it is unknown.
type SignatureStatus = Option<Result<(), String>>;

/// Polls `fetch` until the transaction lands or fails, or `timeout` runs out.
/// Failed status reads are retried like unknown ones until the deadline.
async fn await_confirmation<F, Fut>(
    signature: &str,
    poll: Duration,
    timeout: Duration,
    mut fetch: F,
) -> Result<(), LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SignatureStatus, LedgerError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match fetch().await {
            Ok(Some(Ok(()))) => return Ok(()),
            Ok(Some(Err(detail))) => {
                return Err(LedgerError::Rejected {
                    signature: signature.to_string(),
                    detail,
                })
            }
            Ok(None) => {}
            Err(err) => warn!(signature, error = %err, "signature status unavailable, retrying"),
        }
        if Instant::now() >= deadline {
            return Err(LedgerError::Timeout(signature.to_string()));
        }
        time::sleep(poll).await;
    }
}

impl RpcLedger {
    pub fn connect(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let payer = read_keypair_file(&config.keypair).map_err(|err| LedgerError::Keypair {
            path: config.keypair.display().to_string(),
            detail: err.to_string(),
        })?;
        let payer = Arc::new(payer);
        let cluster: Cluster = config.rpc_url.parse().map_err(rpc_error)?;
        let commitment = config.commitment.into();

        let rpc = RpcClient::new_with_commitment(cluster.url().to_string(), commitment);
        let client = Client::new_with_options(cluster, Arc::clone(&payer), commitment);
        let program = client.program(lotto_program::ID)?;

        Ok(Self {
            program,
            rpc,
            payer,
            commitment,
            confirm_poll: config.confirm_poll(),
            confirm_timeout: config.confirm_timeout(),
        })
    }

    async fn config(&self) -> Result<Config, LedgerError> {
        Ok(self.program.account::<Config>(Config::address()).await?)
    }

    fn entry_instruction(&self, round: u64, numbers: &[u8; PICK_COUNT], stake: u64) -> Instruction {
        let player = self.payer.pubkey();
        Instruction {
            program_id: lotto_program::ID,
            accounts: lotto_program::accounts::EnterLottery {
                config: Config::address(),
                entry: Entry::address(round, &player),
                treasury: Treasury::address(),
                player,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: lotto_program::instruction::EnterLottery {
                numbers: *numbers,
                stake,
            }
            .data(),
        }
    }

    fn reset_instruction(&self) -> Instruction {
        Instruction {
            program_id: lotto_program::ID,
            accounts: lotto_program::accounts::ResetLottery {
                config: Config::address(),
                owner: self.payer.pubkey(),
            }
            .to_account_metas(None),
            data: lotto_program::instruction::ResetLottery {}.data(),
        }
    }

    async fn sign(&self, instruction: Instruction) -> Result<Transaction, LedgerError> {
        let blockhash = self.rpc.get_latest_blockhash().await.map_err(rpc_error)?;
        Ok(Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[self.payer.as_ref()],
            blockhash,
        ))
    }

    async fn send(&self, instruction: Instruction) -> Result<PendingTx, LedgerError> {
        let transaction = self.sign(instruction).await?;
        let signature = self
            .rpc
            .send_transaction(&transaction)
            .await
            .map_err(rpc_error)?;
        Ok(PendingTx::new(signature.to_string()))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn account(&self) -> Pubkey {
        self.payer.pubkey()
    }

    async fn owner(&self) -> Result<Pubkey, LedgerError> {
        Ok(self.config().await?.owner)
    }

    async fn has_entered(&self, player: &Pubkey) -> Result<bool, LedgerError> {
        let round = self.config().await?.round;
        let entry = self
            .rpc
            .get_account_with_commitment(&Entry::address(round, player), self.commitment)
            .await
            .map_err(rpc_error)?;
        Ok(entry.value.is_some())
    }

    async fn estimate_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<u64, LedgerError> {
        let round = self.config().await?.round;
        let transaction = self
            .sign(self.entry_instruction(round, numbers, stake))
            .await?;
        let simulation = self
            .rpc
            .simulate_transaction(&transaction)
            .await
            .map_err(rpc_error)?
            .value;

        if let Some(err) = simulation.err {
            // Anchor logs the program error's message; it reads better than
            // the bare instruction error.
            let detail = simulation
                .logs
                .unwrap_or_default()
                .into_iter()
                .rev()
                .find(|line| line.contains("Error Message"))
                .unwrap_or_else(|| err.to_string());
            return Err(LedgerError::Simulation(detail));
        }

        let units = simulation.units_consumed.unwrap_or_default();
        debug!(units, "entry simulated");
        Ok(units)
    }

    async fn submit_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<PendingTx, LedgerError> {
        let round = self.config().await?.round;
        self.send(self.entry_instruction(round, numbers, stake))
            .await
    }

    async fn submit_reset(&self) -> Result<PendingTx, LedgerError> {
        self.send(self.reset_instruction()).await
    }

    async fn wait(&self, tx: &PendingTx) -> Result<(), LedgerError> {
        let signature: Signature = tx
            .id()
            .parse()
            .map_err(|_| LedgerError::Rpc(format!("malformed signature {}", tx.id())))?;
        let (rpc, signature, commitment) = (&self.rpc, &signature, self.commitment);

        await_confirmation(tx.id(), self.confirm_poll, self.confirm_timeout, move || async move {
            let status = rpc
                .get_signature_status_with_commitment(signature, commitment)
                .await
                .map_err(rpc_error)?;
            Ok(status.map(|result| result.map_err(|err| err.to_string())))
        })
        .await
    }

    async fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        self.rpc.get_balance(account).await.map_err(rpc_error)
    }
}
