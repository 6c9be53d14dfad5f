use anchor_lang::prelude::*;

use crate::constants::TREASURY_SEED;

// 8 discriminator, 1 bump
pub const TREASURY_ACCOUNT_SIZE: usize = 8 + 1;

#[account]
pub struct Treasury {
    pub bump: u8,
}

impl Treasury {
    pub fn address() -> Pubkey {
        Pubkey::find_program_address(&[TREASURY_SEED], &crate::ID).0
    }
}
