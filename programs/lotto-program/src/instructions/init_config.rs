use crate::{
    constants::{CONFIG_SEED, TREASURY_SEED},
    error::LottoError,
    state::{Config, Treasury, CONFIG_ACCOUNT_SIZE, TREASURY_ACCOUNT_SIZE},
};
use anchor_lang::prelude::*;

/// Instruction to initialize the lottery configuration and its treasury
/// This should be called once after deployment
///
/// # Arguments
/// * `ctx` - The context object containing all required accounts
/// * `stake` - Lamports every entry must stake (must be > 0)
///
/// # Account Validations
/// * Config - New PDA with seed "config"; the signer is recorded as owner
/// * Treasury - New PDA with seed "treasury" that custodies stakes
/// * Owner - Signer paying for both accounts
pub fn init_config(ctx: Context<InitConfig>, stake: u64) -> Result<()> {
    require!(stake > 0, LottoError::StakeTooLow);

    let config = &mut ctx.accounts.config;
    config.owner = ctx.accounts.owner.key();
    config.stake = stake;
    config.round = 0;
    config.entries = 0;
    config.bump = ctx.bumps.config;
    ctx.accounts.treasury.bump = ctx.bumps.treasury;

    msg!("Lottery configured by {} with stake {}", config.owner, stake);
    Ok(())
}

#[derive(Accounts)]
pub struct InitConfig<'info> {
    #[account(
        init,
        payer = owner,
        space = CONFIG_ACCOUNT_SIZE,
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = owner,
        space = TREASURY_ACCOUNT_SIZE,
        seeds = [TREASURY_SEED],
        bump
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}
