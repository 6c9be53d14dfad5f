use std::{sync::Arc, time::Duration};

use anchor_lang::prelude::Pubkey;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use super::Ledger;
use crate::game::RoundEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(15_000);

/// Republishes the ledger's balance for one account as
/// [`RoundEvent::Balance`], immediately and then once per interval, until
/// stopped or dropped. Failed reads are skipped; the last good value stands.
pub struct BalancePoller {
    handle: JoinHandle<()>,
}

impl BalancePoller {
    pub fn spawn(
        ledger: Arc<dyn Ledger>,
        account: Pubkey,
        interval: Duration,
        events: UnboundedSender<RoundEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match ledger.balance(&account).await {
                    Ok(amount) => {
                        debug!(%account, amount, "balance refreshed");
                        if events.send(RoundEvent::Balance(amount)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%account, error = %err, "balance refresh failed"),
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
