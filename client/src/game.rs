use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::RoundConfig,
    countdown::Countdown,
    draw::{self, RandomSource},
    error::RoundFailure,
    ledger::{BalancePoller, Ledger, LedgerSettlement},
    payout::Outcome,
    round::{Balance, RoundMachine, RoundState, Tick},
    PICK_COUNT,
};

/// Everything that reaches a round from outside the caller's own calls.
/// Events carrying an `epoch` are ignored unless it is the running commit's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Tick { epoch: u64 },
    EntryConfirmed { epoch: u64 },
    EntryFailed { epoch: u64, detail: String },
    Balance(u64),
}

/// Read-only snapshot for whatever presents the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub state: RoundState,
    pub selected: Vec<u8>,
    pub drawn: Vec<u8>,
    pub countdown: Option<u32>,
    pub result: Option<Outcome>,
    /// `None` while a ledger balance has not been read yet.
    pub balance: Option<u64>,
    pub is_owner: bool,
    pub failure: Option<RoundFailure>,
}

impl RoundView {
    /// The line to show the player: the last failure, else the result.
    pub fn message(&self) -> Option<String> {
        self.failure
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| self.result.map(|outcome| outcome.message()))
    }
}

/// One player's table. Owns the round, its countdown and, against the
/// ledger, the settlement adapter and balance poller. All background work
/// reports back through a single event queue drained by [`Game::step`], so
/// round logic only ever runs on the caller's task.
pub struct Game {
    machine: RoundMachine,
    countdown: Countdown,
    ticks: u32,
    settlement: Option<LedgerSettlement>,
    poller: Option<BalancePoller>,
    confirmation: Option<JoinHandle<()>>,
    source: Box<dyn RandomSource + Send>,
    events_tx: UnboundedSender<RoundEvent>,
    events_rx: UnboundedReceiver<RoundEvent>,
    failure: Option<RoundFailure>,
}

impl Game {
    fn new(
        balance: Balance,
        config: &RoundConfig,
        source: Box<dyn RandomSource + Send>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let ticks = config.countdown.max(1);
        Self {
            machine: RoundMachine::new(balance, config.stake, ticks),
            countdown: Countdown::new(config.tick_period()),
            ticks,
            settlement: None,
            poller: None,
            confirmation: None,
            source,
            events_tx,
            events_rx,
            failure: None,
        }
    }

    /// A round played against an in-memory balance.
    pub fn local(config: &RoundConfig, source: impl RandomSource + Send + 'static) -> Self {
        Self::new(Balance::Local(config.balance), config, Box::new(source))
    }

    /// A round whose stake, entry and reset go through `ledger`. The balance
    /// is unknown until the first poll lands.
    pub async fn with_ledger(
        ledger: Arc<dyn Ledger>,
        config: &RoundConfig,
        poll_interval: Duration,
        source: impl RandomSource + Send + 'static,
    ) -> Self {
        let mut game = Self::new(Balance::Ledger(None), config, Box::new(source));
        let settlement = LedgerSettlement::connect(ledger).await;
        game.poller = Some(settlement.poll_balance(poll_interval, game.events_tx.clone()));
        game.settlement = Some(settlement);
        game
    }

    pub fn view(&self) -> RoundView {
        RoundView {
            state: self.machine.state(),
            selected: self.machine.selected().to_vec(),
            drawn: self.machine.drawn().to_vec(),
            countdown: self.machine.countdown(),
            result: self.machine.result().copied(),
            balance: self.machine.balance().available(),
            is_owner: self.is_owner(),
            failure: self.failure.clone(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.settlement
            .as_ref()
            .is_some_and(LedgerSettlement::is_owner)
    }

    pub fn toggle_selection(&mut self, number: u8) -> bool {
        self.machine.toggle_selection(number)
    }

    /// Stakes the current picks. `Ok(false)` means a precondition did not
    /// hold and nothing happened. An `Err` leaves the round where it was
    /// before the call, stake included.
    pub async fn commit(&mut self) -> Result<bool, RoundFailure> {
        let Some(numbers) = self.machine.picks() else {
            return Ok(false);
        };
        if !self.machine.can_commit() {
            return Ok(false);
        }
        self.failure = None;

        if self.settlement.is_none() {
            return Ok(self.commit_locally());
        }

        let committed = self.commit_to_ledger(numbers).await;
        if let Err(failure) = &committed {
            self.failure = Some(failure.clone());
        }
        committed
    }

    fn commit_locally(&mut self) -> bool {
        let Some(commitment) = self.machine.commit(false) else {
            return false;
        };
        self.countdown
            .start(commitment.epoch, self.ticks, self.events_tx.clone());
        info!(epoch = commitment.epoch, numbers = ?commitment.numbers, stake = commitment.stake, "round committed");
        true
    }

    async fn commit_to_ledger(&mut self, numbers: [u8; PICK_COUNT]) -> Result<bool, RoundFailure> {
        let Some(settlement) = self.settlement.as_ref() else {
            return Ok(false);
        };
        let stake = self.machine.stake();

        settlement.check_not_already_entered().await?;
        settlement.estimate_cost(&numbers, stake).await?;

        let Some(commitment) = self.machine.commit(true) else {
            return Ok(false);
        };
        self.countdown
            .start(commitment.epoch, self.ticks, self.events_tx.clone());

        match settlement.submit_entry(&commitment.numbers, commitment.stake).await {
            Ok(pending) => {
                let handle =
                    settlement.spawn_confirmation(pending, commitment.epoch, self.events_tx.clone());
                if let Some(previous) = self.confirmation.replace(handle) {
                    previous.abort();
                }
                info!(epoch = commitment.epoch, numbers = ?commitment.numbers, stake, "round committed");
                Ok(true)
            }
            Err(failure) => {
                self.countdown.cancel();
                self.machine.revert(commitment.epoch);
                Err(failure)
            }
        }
    }

    /// Clears the round back to an empty selection. Against the ledger the
    /// ledger's own reset has to land first, and only its owner may do that.
    pub async fn reset_round(&mut self) -> Result<(), RoundFailure> {
        if let Some(settlement) = &self.settlement {
            if let Err(failure) = settlement.reset_round().await {
                self.failure = Some(failure.clone());
                return Err(failure);
            }
        }

        self.countdown.cancel();
        if let Some(confirmation) = self.confirmation.take() {
            confirmation.abort();
        }
        self.machine.reset();
        self.failure = None;
        info!(epoch = self.machine.epoch(), "round reset");
        Ok(())
    }

    /// Leaves a settled round with the same picks selected.
    pub fn next_round(&mut self) -> bool {
        let moved = self.machine.next_round();
        if moved {
            self.failure = None;
        }
        moved
    }

    pub fn apply(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::Tick { epoch } => match self.machine.tick(epoch) {
                Tick::Stale => debug!(epoch, "stale tick ignored"),
                Tick::Counting(remaining) => debug!(epoch, remaining, "tick"),
                Tick::Expired => {
                    debug!(epoch, "countdown elapsed");
                    self.try_settle();
                }
            },
            RoundEvent::EntryConfirmed { epoch } => {
                if self.machine.confirm(epoch) {
                    self.try_settle();
                }
            }
            RoundEvent::EntryFailed { epoch, detail } => {
                if self.machine.revert(epoch) {
                    self.countdown.cancel();
                    warn!(epoch, %detail, "entry reverted");
                    self.failure = Some(RoundFailure::Confirmation);
                }
            }
            RoundEvent::Balance(amount) => self.machine.set_ledger_balance(amount),
        }
    }

    fn try_settle(&mut self) {
        if !self.machine.ready_to_draw() {
            debug!(epoch = self.machine.epoch(), "draw waiting for confirmation");
            return;
        }
        let drawn = draw::draw_numbers(self.source.as_mut());
        if let Some(outcome) = self.machine.settle(drawn) {
            info!(
                epoch = self.machine.epoch(),
                drawn = ?self.machine.drawn(),
                matches = outcome.matches,
                winnings = outcome.winnings,
                "round settled"
            );
        }
    }

    /// Waits for the next event and applies it.
    pub async fn step(&mut self) -> Option<RoundEvent> {
        let event = self.events_rx.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    /// Drives a committed round until it settles or is reverted.
    pub async fn play_out(&mut self) -> RoundView {
        while self.machine.state().is_active() {
            if self.step().await.is_none() {
                break;
            }
        }
        self.view()
    }

    /// Stops every background task. Dropping the game does the same.
    pub fn shutdown(&mut self) {
        self.countdown.cancel();
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(confirmation) = self.confirmation.take() {
            confirmation.abort();
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{draw::SequenceSource, ledger::fake::FakeLedger};
    use tokio::time::{self, Instant};

    const LONG_POLL: Duration = Duration::from_secs(60);

    fn pick_all(game: &mut Game) {
        for n in 1..=6 {
            assert!(game.toggle_selection(n));
        }
    }

    async fn ledger_game(ledger: &Arc<FakeLedger>, drawn: &[u8]) -> Game {
        let mut game = Game::with_ledger(
            ledger.clone(),
            &RoundConfig::default(),
            LONG_POLL,
            SequenceSource::new(drawn.to_vec()),
        )
        .await;
        // the first balance read is published immediately
        assert!(matches!(game.step().await, Some(RoundEvent::Balance(_))));
        game
    }

    async fn quiet_for(game: &mut Game, secs: u64) -> bool {
        time::timeout(Duration::from_secs(secs), game.step())
            .await
            .is_err()
    }

    /// Applies whatever arrives for `secs`, then snapshots the round.
    async fn view_after(game: &mut Game, secs: u64) -> RoundView {
        let drain = async { while game.step().await.is_some() {} };
        let _ = time::timeout(Duration::from_secs(secs), drain).await;
        game.view()
    }

    #[tokio::test(start_paused = true)]
    async fn local_round_plays_out() {
        let mut game = Game::local(
            &RoundConfig::default(),
            SequenceSource::new([1, 2, 3, 7, 8, 9]),
        );
        pick_all(&mut game);
        let started = Instant::now();

        assert_eq!(game.commit().await, Ok(true));
        let view = game.view();
        assert_eq!(view.balance, Some(90));
        assert_eq!(view.state, RoundState::Committed);
        assert_eq!(view.countdown, Some(10));

        let view = game.play_out().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(view.state, RoundState::Settled);
        assert_eq!(view.drawn, vec![1, 2, 3, 7, 8, 9]);
        assert_eq!(view.balance, Some(150));
        assert_eq!(
            view.message().as_deref(),
            Some("You matched 3 number(s) and won $60")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn local_commit_without_funds_does_nothing() {
        let config = RoundConfig {
            balance: 5,
            ..RoundConfig::default()
        };
        let mut game = Game::local(&config, SequenceSource::new([1]));
        pick_all(&mut game);

        assert_eq!(game.commit().await, Ok(false));
        let view = game.view();
        assert_eq!(view.state, RoundState::Selecting);
        assert_eq!(view.balance, Some(5));
        assert!(quiet_for(&mut game, 30).await);
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_happens_once_per_commit() {
        let mut game = Game::local(
            &RoundConfig::default(),
            SequenceSource::new([1, 2, 3, 4, 5, 6, 40, 41, 42, 43, 44, 45]),
        );
        pick_all(&mut game);
        assert_eq!(game.commit().await, Ok(true));
        let settled = game.play_out().await;
        assert_eq!(settled.balance, Some(210));

        for _ in 0..20 {
            game.apply(RoundEvent::Tick { epoch: 1 });
        }
        game.apply(RoundEvent::EntryConfirmed { epoch: 1 });
        assert_eq!(game.view(), settled);
        assert!(quiet_for(&mut game, 30).await);
    }

    #[tokio::test(start_paused = true)]
    async fn local_reset_cancels_the_countdown() {
        let mut game = Game::local(&RoundConfig::default(), SequenceSource::new([1]));
        pick_all(&mut game);
        assert_eq!(game.commit().await, Ok(true));
        assert_eq!(game.step().await, Some(RoundEvent::Tick { epoch: 1 }));

        assert_eq!(game.reset_round().await, Ok(()));
        let view = game.view();
        assert_eq!(view.state, RoundState::Idle);
        assert!(view.selected.is_empty());
        assert_eq!(view.countdown, None);
        assert!(quiet_for(&mut game, 30).await);
    }

    #[tokio::test(start_paused = true)]
    async fn next_round_reuses_the_picks() {
        let mut game = Game::local(&RoundConfig::default(), SequenceSource::new([30]));
        pick_all(&mut game);
        assert_eq!(game.commit().await, Ok(true));
        game.play_out().await;

        assert!(game.next_round());
        assert_eq!(game.view().state, RoundState::Selecting);
        assert_eq!(game.commit().await, Ok(true));
        assert_eq!(game.play_out().await.balance, Some(80));
    }

    #[tokio::test(start_paused = true)]
    async fn ledger_round_settles_after_confirmation() {
        let ledger = Arc::new(FakeLedger::player(100));
        let mut game = ledger_game(&ledger, &[1, 2, 3, 4, 5, 6]).await;
        pick_all(&mut game);

        assert_eq!(game.commit().await, Ok(true));
        assert_eq!(game.view().balance, Some(90));
        assert_eq!(ledger.submitted(), vec![[1, 2, 3, 4, 5, 6]]);

        let view = game.play_out().await;
        assert_eq!(view.state, RoundState::Settled);
        assert_eq!(view.result.map(|outcome| outcome.winnings), Some(120));
        // winnings are paid by the ledger, not by the cached balance
        assert_eq!(view.balance, Some(90));
    }

    #[tokio::test(start_paused = true)]
    async fn late_confirmation_holds_the_draw() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.confirm_after(Duration::from_secs(12));
        let mut game = ledger_game(&ledger, &[1, 2, 3, 4, 5, 6]).await;
        pick_all(&mut game);
        let started = Instant::now();

        assert_eq!(game.commit().await, Ok(true));
        let view = game.play_out().await;
        assert_eq!(started.elapsed(), Duration::from_secs(12));
        assert_eq!(view.state, RoundState::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn late_rejection_reverts_from_drawing() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.confirm_after(Duration::from_secs(12));
        ledger.reject_entry();
        let mut game = ledger_game(&ledger, &[1, 2, 3, 4, 5, 6]).await;
        pick_all(&mut game);

        assert_eq!(game.commit().await, Ok(true));
        for _ in 0..10 {
            assert!(matches!(game.step().await, Some(RoundEvent::Tick { .. })));
        }
        let held = game.view();
        assert_eq!(held.state, RoundState::Drawing);
        assert!(held.drawn.is_empty());
        assert_eq!(held.balance, Some(90));

        let view = game.play_out().await;
        assert_eq!(view.state, RoundState::Selecting);
        assert_eq!(view.balance, Some(100));
        assert_eq!(view.selected, vec![1, 2, 3, 4, 5, 6]);
        assert!(view.drawn.is_empty());
        assert!(view.result.is_none());
        assert_eq!(
            view.message().as_deref(),
            Some("Transaction failed or was rejected.")
        );
        assert_eq!(view_after(&mut game, 30).await, view);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_entry_keeps_the_selection() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.set_entered(true);
        let mut game = ledger_game(&ledger, &[1]).await;
        pick_all(&mut game);

        assert_eq!(game.commit().await, Err(RoundFailure::AlreadyEntered));
        let view = game.view();
        assert_eq!(view.state, RoundState::Selecting);
        assert_eq!(view.balance, Some(100));
        assert_eq!(
            view.message().as_deref(),
            Some("You have already entered the lottery.")
        );
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_check_failure_is_surfaced() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.fail_entry_check("connection reset");
        let mut game = ledger_game(&ledger, &[1]).await;
        pick_all(&mut game);

        assert_eq!(
            game.commit().await,
            Err(RoundFailure::EntryCheck(
                "rpc request failed: connection reset".into()
            ))
        );
        assert_eq!(game.view().state, RoundState::Selecting);
    }

    #[tokio::test(start_paused = true)]
    async fn estimation_failure_moves_no_funds() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.fail_estimate("insufficient funds for fee");
        let mut game = ledger_game(&ledger, &[1]).await;
        pick_all(&mut game);

        let failure = game.commit().await.unwrap_err();
        assert!(matches!(failure, RoundFailure::Estimate(_)));
        assert_eq!(game.view().balance, Some(100));
        assert_eq!(game.view().state, RoundState::Selecting);
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn submission_failure_rolls_back() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.fail_submit("node unhealthy");
        let mut game = ledger_game(&ledger, &[1]).await;
        pick_all(&mut game);
        let before = game.view();

        assert_eq!(
            game.commit().await,
            Err(RoundFailure::Submission(
                "rpc request failed: node unhealthy".into()
            ))
        );
        let view = game.view();
        assert_eq!(view.state, before.state);
        assert_eq!(view.selected, before.selected);
        assert_eq!(view.balance, before.balance);
        assert_eq!(view.countdown, None);
        assert_eq!(view_after(&mut game, 30).await, view);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_entry_rolls_back() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.reject_entry();
        let mut game = ledger_game(&ledger, &[1]).await;
        pick_all(&mut game);

        assert_eq!(game.commit().await, Ok(true));
        let view = game.play_out().await;
        assert_eq!(view.state, RoundState::Selecting);
        assert_eq!(view.balance, Some(100));
        assert_eq!(view.selected, vec![1, 2, 3, 4, 5, 6]);
        assert!(view.result.is_none());
        assert_eq!(
            view.message().as_deref(),
            Some("Transaction failed or was rejected.")
        );
        assert_eq!(view_after(&mut game, 30).await, view);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_ledger_balance_blocks_commit() {
        let ledger = Arc::new(FakeLedger::player(100));
        ledger.fail_balance(true);
        let mut game = Game::with_ledger(
            ledger.clone(),
            &RoundConfig::default(),
            LONG_POLL,
            SequenceSource::new([1]),
        )
        .await;
        pick_all(&mut game);

        assert_eq!(game.view().balance, None);
        assert_eq!(game.commit().await, Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn owner_reset_clears_the_round() {
        let ledger = Arc::new(FakeLedger::owned(100));
        let mut game = ledger_game(&ledger, &[1]).await;
        assert!(game.view().is_owner);
        pick_all(&mut game);
        assert_eq!(game.commit().await, Ok(true));
        game.play_out().await;

        assert_eq!(game.reset_round().await, Ok(()));
        assert_eq!(ledger.resets(), 1);
        let view = game.view();
        assert_eq!(view.state, RoundState::Idle);
        assert!(view.selected.is_empty());
        assert!(view.drawn.is_empty());
        assert!(view.result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn non_owner_reset_changes_nothing() {
        let ledger = Arc::new(FakeLedger::player(100));
        let mut game = ledger_game(&ledger, &[1]).await;
        assert!(!game.view().is_owner);
        game.toggle_selection(8);
        game.toggle_selection(13);
        let before = game.view();

        assert_eq!(game.reset_round().await, Err(RoundFailure::NotOwner));
        let view = game.view();
        assert_eq!(view.selected, before.selected);
        assert_eq!(view.state, RoundState::Selecting);
        assert_eq!(
            view.message().as_deref(),
            Some("Only the contract owner can reset the lottery.")
        );
        assert_eq!(ledger.resets(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_owner_disables_reset_only() {
        let ledger = Arc::new(FakeLedger::without_owner(100));
        let mut game = ledger_game(&ledger, &[1]).await;
        assert!(!game.view().is_owner);
        assert_eq!(game.reset_round().await, Err(RoundFailure::NotOwner));

        pick_all(&mut game);
        assert_eq!(game.commit().await, Ok(true));
    }
}
