//! Six-number lottery rounds.
//!
//! A round is played either against an in-memory balance or against the
//! lotto ledger program, in which case the stake, the entry record and the
//! owner-gated reset live on chain and the local round only mirrors them.

pub mod config;
pub mod countdown;
pub mod draw;
pub mod error;
pub mod game;
pub mod ledger;
pub mod payout;
pub mod round;

pub use game::{Game, RoundEvent, RoundView};
pub use lotto_program::constants::{MAX_NUMBER, MIN_NUMBER, PICK_COUNT};
