use anchor_lang::prelude::*;

use crate::{constants::CONFIG_SEED, error::LottoError, state::Config};

/// Event emitted when the owner opens a new round
#[event]
pub struct LotteryReset {
    /// The round that was closed
    pub closed_round: u64,
    /// Entries the closed round received
    pub entries: u64,
}

/// Instruction to close the current round and open the next one
///
/// # Account Validations
/// * Config - Its owner must sign
///
/// # Implementation Notes
/// - Entries are keyed by round, so advancing the round lets every player
///   enter again without touching the old entry accounts
/// - No funds are moved
pub fn reset_lottery(ctx: Context<ResetLottery>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let closed_round = config.round;
    let entries = config.entries;

    config.round = config.round.checked_add(1).ok_or(LottoError::Overflow)?;
    config.entries = 0;

    msg!("Round {} closed with {} entries", closed_round, entries);
    emit!(LotteryReset {
        closed_round,
        entries,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct ResetLottery<'info> {
    #[account(
        mut,
        seeds = [CONFIG_SEED],
        bump = config.bump,
        has_one = owner @ LottoError::NotOwner,
    )]
    pub config: Account<'info, Config>,

    pub owner: Signer<'info>,
}
