use anchor_lang::prelude::*;

use crate::constants::CONFIG_SEED;

// 8 discriminator + 32 owner + 8 stake + 8 round + 8 entries + 1 bump
pub const CONFIG_ACCOUNT_SIZE: usize = 8 + 32 + 8 + 8 + 8 + 1;

#[account]
pub struct Config {
    /// The only account allowed to reset the lottery
    pub owner: Pubkey,
    /// Lamports every entry must stake
    pub stake: u64,
    /// Current round; entries are keyed by it, so bumping it clears them all
    pub round: u64,
    /// Entries accepted in the current round
    pub entries: u64,
    pub bump: u8,
}

impl Config {
    pub fn address() -> Pubkey {
        Pubkey::find_program_address(&[CONFIG_SEED], &crate::ID).0
    }
}
