use std::{sync::Arc, time::Duration};

use anchor_lang::prelude::Pubkey;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, info, warn};

use super::{BalancePoller, Ledger, PendingTx};
use crate::{error::RoundFailure, game::RoundEvent, PICK_COUNT};

/// Turns round intents into ledger calls and ledger answers into
/// [`RoundFailure`]s or [`RoundEvent`]s. The owner is looked up once, when
/// connecting, and cached for the life of the connection.
pub struct LedgerSettlement {
    ledger: Arc<dyn Ledger>,
    owner: Option<Pubkey>,
}

impl LedgerSettlement {
    /// Never fails: if the owner cannot be read, owner-gated actions are
    /// simply unavailable.
    pub async fn connect(ledger: Arc<dyn Ledger>) -> Self {
        let owner = match ledger.owner().await {
            Ok(owner) => {
                info!(%owner, account = %ledger.account(), "connected to lottery ledger");
                Some(owner)
            }
            Err(err) => {
                warn!(error = %err, "could not read the lottery owner; reset disabled");
                None
            }
        };
        Self { ledger, owner }
    }

    pub fn account(&self) -> Pubkey {
        self.ledger.account()
    }

    pub fn owner(&self) -> Option<Pubkey> {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        self.owner == Some(self.ledger.account())
    }

    /// Always asks the ledger; a cached answer is never trusted for this.
    pub async fn check_not_already_entered(&self) -> Result<(), RoundFailure> {
        match self.ledger.has_entered(&self.account()).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(RoundFailure::AlreadyEntered),
            Err(err) => Err(RoundFailure::EntryCheck(err.to_string())),
        }
    }

    pub async fn estimate_cost(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<u64, RoundFailure> {
        let cost = self
            .ledger
            .estimate_entry(numbers, stake)
            .await
            .map_err(|err| RoundFailure::Estimate(err.to_string()))?;
        debug!(cost, "entry cost estimated");
        Ok(cost)
    }

    pub async fn submit_entry(
        &self,
        numbers: &[u8; PICK_COUNT],
        stake: u64,
    ) -> Result<PendingTx, RoundFailure> {
        let pending = self
            .ledger
            .submit_entry(numbers, stake)
            .await
            .map_err(|err| RoundFailure::Submission(err.to_string()))?;
        info!(signature = pending.id(), ?numbers, stake, "entry submitted");
        Ok(pending)
    }

    /// Waits for `pending` in the background and reports the answer for
    /// `epoch` as [`RoundEvent::EntryConfirmed`] or
    /// [`RoundEvent::EntryFailed`].
    pub fn spawn_confirmation(
        &self,
        pending: PendingTx,
        epoch: u64,
        events: UnboundedSender<RoundEvent>,
    ) -> JoinHandle<()> {
        let ledger = Arc::clone(&self.ledger);
        tokio::spawn(async move {
            let event = match ledger.wait(&pending).await {
                Ok(()) => {
                    info!(signature = pending.id(), epoch, "entry confirmed");
                    RoundEvent::EntryConfirmed { epoch }
                }
                Err(err) => {
                    warn!(signature = pending.id(), epoch, error = %err, "entry failed");
                    RoundEvent::EntryFailed {
                        epoch,
                        detail: err.to_string(),
                    }
                }
            };
            // The receiver is gone only once the game is torn down.
            let _ = events.send(event);
        })
    }

    pub fn poll_balance(
        &self,
        interval: Duration,
        events: UnboundedSender<RoundEvent>,
    ) -> BalancePoller {
        BalancePoller::spawn(Arc::clone(&self.ledger), self.account(), interval, events)
    }

    /// Resets the ledger's round and waits for it to land. Any failure,
    /// including not being the owner, is reported as [`RoundFailure::NotOwner`].
    pub async fn reset_round(&self) -> Result<(), RoundFailure> {
        if !self.is_owner() {
            warn!(account = %self.account(), owner = ?self.owner, "reset refused");
            return Err(RoundFailure::NotOwner);
        }

        let pending = self.ledger.submit_reset().await.map_err(|err| {
            warn!(error = %err, "reset submission failed");
            RoundFailure::NotOwner
        })?;
        self.ledger.wait(&pending).await.map_err(|err| {
            warn!(signature = pending.id(), error = %err, "reset failed");
            RoundFailure::NotOwner
        })?;

        info!(signature = pending.id(), "lottery reset");
        Ok(())
    }
}
