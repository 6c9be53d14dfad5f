use anchor_lang::prelude::*;
use instructions::*;

pub mod constants;
pub mod error;
pub mod instructions;
pub mod state;

declare_id!("42jrNatQL9qoy8MUJxbcY2PUN5SBC3JVvkQo6eeGDATt");

#[program]
pub mod lotto_program {
    use super::*;

    pub fn init_config(ctx: Context<InitConfig>, stake: u64) -> Result<()> {
        instructions::init_config::init_config(ctx, stake)
    }

    pub fn enter_lottery(
        ctx: Context<EnterLottery>,
        numbers: [u8; 6],
        stake: u64,
    ) -> Result<()> {
        instructions::enter_lottery::enter_lottery(ctx, numbers, stake)
    }

    pub fn reset_lottery(ctx: Context<ResetLottery>) -> Result<()> {
        instructions::reset_lottery::reset_lottery(ctx)
    }
}
