use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::debug;

use crate::game::RoundEvent;

/// Drives the Committed -> Drawing transition by sending one
/// [`RoundEvent::Tick`] per period. At most one countdown runs at a time:
/// starting a new one cancels the previous one first.
pub struct Countdown {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    pub fn start(&mut self, epoch: u64, ticks: u32, events: UnboundedSender<RoundEvent>) {
        self.cancel();

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            for _ in 0..ticks {
                interval.tick().await;
                if events.send(RoundEvent::Tick { epoch }).is_err() {
                    break;
                }
            }
        }));
        debug!(epoch, ticks, "countdown started");
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
