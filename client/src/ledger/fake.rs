use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;

use super::{Ledger, PendingTx};
use crate::{error::LedgerError, PICK_COUNT};

#[derive(Default)]
struct FakeState {
    balance: u64,
    fail_balance: bool,
    entered: bool,
    fail_entry_check: Option<String>,
    fail_estimate: Option<String>,
    fail_submit: Option<String>,
    confirm_delay: Duration,
    reject_entry: bool,
    fail_reset: Option<String>,
    submitted: Vec<[u8; PICK_COUNT]>,
    resets: u32,
}

/// In-memory ledger with scriptable failures.
pub(crate) struct FakeLedger {
    account: Pubkey,
    owner: Option<Pubkey>,
    state: Mutex<FakeState>,
}

impl FakeLedger {
    fn new(owner: Option<Pubkey>, account: Pubkey, balance: u64) -> Self {
        Self {
            account,
            owner,
            state: Mutex::new(FakeState {
                balance,
                confirm_delay: Duration::from_secs(2),
                ..FakeState::default()
            }),
        }
    }

    /// Signs for an account that does not own the lottery.
    pub fn player(balance: u64) -> Self {
        Self::new(Some(Pubkey::new_unique()), Pubkey::new_unique(), balance)
    }

    /// Signs for the lottery's owner.
    pub fn owned(balance: u64) -> Self {
        let account = Pubkey::new_unique();
        Self::new(Some(account), account, balance)
    }

    /// The owner lookup always fails.
    pub fn without_owner(balance: u64) -> Self {
        Self::new(None, Pubkey::new_unique(), balance)
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake ledger lock")
    }

    pub fn set_balance(&self, balance: u64) {
        self.state().balance = balance;
    }

    pub fn fail_balance(&self, fail: bool) {
        self.state().fail_balance = fail;
    }

    pub fn set_entered(&self, entered: bool) {
        self.state().entered = entered;
    }

    pub fn fail_entry_check(&self, detail: &str) {
        self.state().fail_entry_check = Some(detail.to_string());
    }

    pub fn fail_estimate(&self, detail: &str) {
        self.state().fail_estimate = Some(detail.to_string());
    }

    pub fn fail_submit(&self, detail: &str) {
        self.state().fail_submit = Some(detail.to_string());
    }

    pub fn confirm_after(&self, delay: Duration) {
        self.state().confirm_delay = delay;
    }

    pub fn reject_entry(&self) {
        self.state().reject_entry = true;
    }

    pub fn fail_reset(&self, detail: &str) {
        self.state().fail_reset = Some(detail.to_string());
    }

    pub fn submitted(&self) -> Vec<[u8; PICK_COUNT]> {
        self.state().submitted.clone()
    }

    pub fn resets(&self) -> u32 {
        self.state().resets
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    fn account(&self) -> Pubkey {
        self.account
    }

    async fn owner(&self) -> Result<Pubkey, LedgerError> {
        self.owner
            .ok_or_else(|| LedgerError::Rpc("connection refused".to_string()))
    }

    async fn has_entered(&self, _player: &Pubkey) -> Result<bool, LedgerError> {
        let state = self.state();
        match &state.fail_entry_check {
            Some(detail) => Err(LedgerError::Rpc(detail.clone())),
            None => Ok(state.entered),
        }
    }

    async fn estimate_entry(
        &self,
        _numbers: &[u8; PICK_COUNT],
        _stake: u64,
    ) -> Result<u64, LedgerError> {
        match &self.state().fail_estimate {
            Some(detail) => Err(LedgerError::Simulation(detail.clone())),
            None => Ok(5_000),
        }
    }

    async fn submit_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        _stake: u64,
    ) -> Result<PendingTx, LedgerError> {
        let mut state = self.state();
        if let Some(detail) = &state.fail_submit {
            return Err(LedgerError::Rpc(detail.clone()));
        }
        state.submitted.push(*numbers);
        Ok(PendingTx::new(format!("entry-{}", state.submitted.len())))
    }

    async fn submit_reset(&self) -> Result<PendingTx, LedgerError> {
        let state = self.state();
        match &state.fail_reset {
            Some(detail) => Err(LedgerError::Rpc(detail.clone())),
            None => Ok(PendingTx::new(format!("reset-{}", state.resets + 1))),
        }
    }

    async fn wait(&self, tx: &PendingTx) -> Result<(), LedgerError> {
        let (delay, reject) = {
            let state = self.state();
            (state.confirm_delay, state.reject_entry)
        };
        tokio::time::sleep(delay).await;

        if tx.id().starts_with("reset") {
            let mut state = self.state();
            state.resets += 1;
            state.entered = false;
            return Ok(());
        }
        if reject {
            return Err(LedgerError::Rejected {
                signature: tx.id().to_string(),
                detail: "custom program error: 0x0".to_string(),
            });
        }
        self.state().entered = true;
        Ok(())
    }

    async fn balance(&self, _account: &Pubkey) -> Result<u64, LedgerError> {
        let state = self.state();
        if state.fail_balance {
            return Err(LedgerError::Rpc("node is behind".to_string()));
        }
        Ok(state.balance)
    }
}
