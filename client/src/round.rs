use crate::{
    payout::{self, Outcome},
    MAX_NUMBER, MIN_NUMBER, PICK_COUNT,
};

/// Where a round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Nothing picked yet.
    Idle,
    /// One to six numbers picked, still editable.
    Selecting,
    /// Stake accepted, countdown running.
    Committed,
    /// Countdown elapsed, waiting to draw.
    Drawing,
    /// Result computed; inert until the next round.
    Settled,
}

impl RoundState {
    pub fn is_selectable(self) -> bool {
        matches!(self, RoundState::Idle | RoundState::Selecting)
    }

    /// A committed round that has not settled yet.
    pub fn is_active(self) -> bool {
        matches!(self, RoundState::Committed | RoundState::Drawing)
    }
}

/// The player's spendable funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    /// Owned by the process and moved by the round itself.
    Local(u64),
    /// Last value read from the ledger; `None` until a read succeeds.
    Ledger(Option<u64>),
}

impl Balance {
    pub fn available(&self) -> Option<u64> {
        match *self {
            Balance::Local(amount) => Some(amount),
            Balance::Ledger(amount) => amount,
        }
    }

    fn debit(&mut self, amount: u64) {
        match self {
            Balance::Local(value) | Balance::Ledger(Some(value)) => {
                *value = value.saturating_sub(amount)
            }
            Balance::Ledger(None) => {}
        }
    }

    fn credit(&mut self, amount: u64) {
        match self {
            Balance::Local(value) | Balance::Ledger(Some(value)) => {
                *value = value.saturating_add(amount)
            }
            Balance::Ledger(None) => {}
        }
    }
}

/// Handed out by a successful commit. Everything scheduled on behalf of the
/// commit carries `epoch` back so stale work can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    pub epoch: u64,
    pub numbers: [u8; PICK_COUNT],
    pub stake: u64,
}

/// What one countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not for the running round, ignored.
    Stale,
    /// Ticks left before the draw.
    Counting(u32),
    /// The countdown just reached zero.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    NotRequired,
    Pending,
    Confirmed,
}

/// The round state machine. It never blocks and never talks to the outside;
/// timers and ledger callbacks are fed in by whoever drives it.
#[derive(Debug, Clone)]
pub struct RoundMachine {
    state: RoundState,
    selected: Vec<u8>,
    drawn: Vec<u8>,
    countdown: Option<u32>,
    result: Option<Outcome>,
    last_result: Option<Outcome>,
    balance: Balance,
    stake: u64,
    countdown_ticks: u32,
    epoch: u64,
    confirmation: Confirmation,
    // Stake taken from the balance ahead of ledger confirmation.
    optimistic_debit: u64,
}

impl RoundMachine {
    pub fn new(balance: Balance, stake: u64, countdown_ticks: u32) -> Self {
        Self {
            state: RoundState::Idle,
            selected: Vec::with_capacity(PICK_COUNT),
            drawn: Vec::with_capacity(PICK_COUNT),
            countdown: None,
            result: None,
            last_result: None,
            balance,
            stake,
            countdown_ticks: countdown_ticks.max(1),
            epoch: 0,
            confirmation: Confirmation::NotRequired,
            optimistic_debit: 0,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn selected(&self) -> &[u8] {
        &self.selected
    }

    pub fn drawn(&self) -> &[u8] {
        &self.drawn
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn result(&self) -> Option<&Outcome> {
        self.result.as_ref()
    }

    pub fn last_result(&self) -> Option<&Outcome> {
        self.last_result.as_ref()
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.confirmation == Confirmation::Pending
    }

    /// The six picks, once there are six.
    pub fn picks(&self) -> Option<[u8; PICK_COUNT]> {
        <[u8; PICK_COUNT]>::try_from(self.selected.as_slice()).ok()
    }

    /// Adds `number` if absent and there is room, removes it if present.
    /// Returns whether the selection changed.
    pub fn toggle_selection(&mut self, number: u8) -> bool {
        if !self.state.is_selectable() || !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
            return false;
        }

        if let Some(position) = self.selected.iter().position(|n| *n == number) {
            self.selected.remove(position);
        } else if self.selected.len() < PICK_COUNT {
            self.selected.push(number);
        } else {
            return false;
        }

        self.state = if self.selected.is_empty() {
            RoundState::Idle
        } else {
            RoundState::Selecting
        };
        true
    }

    pub fn can_commit(&self) -> bool {
        self.state == RoundState::Selecting
            && self.selected.len() == PICK_COUNT
            && self
                .balance
                .available()
                .is_some_and(|amount| amount >= self.stake)
    }

    /// Takes the stake and starts a new commit epoch. With
    /// `requires_confirmation` the round will not draw until [`confirm`]
    /// is called for the returned epoch.
    ///
    /// [`confirm`]: RoundMachine::confirm
    pub fn commit(&mut self, requires_confirmation: bool) -> Option<Commitment> {
        if !self.can_commit() {
            return None;
        }
        let numbers = self.picks()?;

        self.balance.debit(self.stake);
        self.optimistic_debit = if requires_confirmation { self.stake } else { 0 };
        self.epoch += 1;
        self.state = RoundState::Committed;
        self.countdown = Some(self.countdown_ticks);
        self.drawn.clear();
        self.result = None;
        self.confirmation = if requires_confirmation {
            Confirmation::Pending
        } else {
            Confirmation::NotRequired
        };

        Some(Commitment {
            epoch: self.epoch,
            numbers,
            stake: self.stake,
        })
    }

    pub fn tick(&mut self, epoch: u64) -> Tick {
        if epoch != self.epoch || self.state != RoundState::Committed {
            return Tick::Stale;
        }

        let remaining = self.countdown.unwrap_or(0).saturating_sub(1);
        self.countdown = Some(remaining);
        if remaining > 0 {
            return Tick::Counting(remaining);
        }

        self.state = RoundState::Drawing;
        Tick::Expired
    }

    /// Records that the ledger accepted the entry for `epoch`. Returns
    /// whether it was accepted for the running round.
    pub fn confirm(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch
            || !self.state.is_active()
            || self.confirmation != Confirmation::Pending
        {
            return false;
        }
        self.confirmation = Confirmation::Confirmed;
        self.optimistic_debit = 0;
        true
    }

    pub fn ready_to_draw(&self) -> bool {
        self.state == RoundState::Drawing && self.confirmation != Confirmation::Pending
    }

    /// Scores `drawn` against the picks and settles the round. Winnings are
    /// credited only to a local balance; a ledger balance is left to the
    /// next read.
    pub fn settle(&mut self, drawn: Vec<u8>) -> Option<Outcome> {
        if !self.ready_to_draw() {
            return None;
        }

        let outcome = payout::settle(&self.selected, &drawn);
        if let Balance::Local(_) = self.balance {
            self.balance.credit(outcome.winnings);
        }
        self.drawn = drawn;
        self.result = Some(outcome);
        self.state = RoundState::Settled;
        self.confirmation = Confirmation::NotRequired;
        Some(outcome)
    }

    /// Undoes the commit for `epoch`: the stake comes back and the picks are
    /// editable again. Returns whether anything was undone.
    pub fn revert(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || !self.state.is_active() {
            return false;
        }

        self.balance.credit(self.optimistic_debit);
        self.optimistic_debit = 0;
        self.state = RoundState::Selecting;
        self.countdown = None;
        self.drawn.clear();
        self.confirmation = Confirmation::NotRequired;
        true
    }

    /// Replaces the cached ledger balance. The ledger value is authoritative,
    /// so any optimistic debit is considered absorbed by it.
    pub fn set_ledger_balance(&mut self, amount: u64) {
        if let Balance::Ledger(cached) = &mut self.balance {
            *cached = Some(amount);
            self.optimistic_debit = 0;
        }
    }

    /// Starts over from an empty selection. Anything still in flight for the
    /// current epoch becomes stale.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.state = RoundState::Idle;
        self.selected.clear();
        self.drawn.clear();
        self.countdown = None;
        self.result = None;
        self.confirmation = Confirmation::NotRequired;
        self.optimistic_debit = 0;
    }

    /// Leaves a settled round, keeping the picks for another go.
    pub fn next_round(&mut self) -> bool {
        if self.state != RoundState::Settled {
            return false;
        }

        self.last_result = self.result.take();
        self.drawn.clear();
        self.countdown = None;
        self.state = if self.selected.is_empty() {
            RoundState::Idle
        } else {
            RoundState::Selecting
        };
        true
    }
}
