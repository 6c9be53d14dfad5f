use anchor_lang::prelude::*;

use crate::constants::{ENTRY_SEED, PICK_COUNT};

// 8 discriminator + 32 player + 8 round + 6 numbers + 1 bump
pub const ENTRY_ACCOUNT_SIZE: usize = 8 + 32 + 8 + PICK_COUNT + 1;

/// Proof that `player` entered `round`. Only the enter_lottery instruction
/// creates one.
#[account]
pub struct Entry {
    pub player: Pubkey,
    pub round: u64,
    pub numbers: [u8; PICK_COUNT],
    pub bump: u8,
}

impl Entry {
    pub fn address(round: u64, player: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(
            &[ENTRY_SEED, round.to_le_bytes().as_ref(), player.as_ref()],
            &crate::ID,
        )
        .0
    }
}
