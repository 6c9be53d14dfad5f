use anchor_lang::prelude::*;

use crate::{
    constants::{CONFIG_SEED, ENTRY_SEED, MAX_NUMBER, MIN_NUMBER, PICK_COUNT, TREASURY_SEED},
    error::LottoError,
    state::{Config, Entry, Treasury, ENTRY_ACCOUNT_SIZE},
};

/// Event emitted when a player enters the current round
#[event]
pub struct LotteryEntered {
    /// The player's address
    pub player: Pubkey,
    /// Round the entry belongs to
    pub round: u64,
    /// The six numbers picked
    pub numbers: [u8; PICK_COUNT],
    /// Lamports moved into the treasury
    pub stake: u64,
}

/// Instruction to enter the current lottery round with six numbers
///
/// # Arguments
/// * `ctx` - The context object containing all required accounts
/// * `numbers` - Six distinct numbers in 1..=49
/// * `stake` - Lamports offered; must equal the configured stake
///
/// # Security Considerations
/// 1. Rejects a stake that differs from the configured one
/// 2. Rejects out-of-range or repeated numbers
/// 3. Ensures the player can pay the stake
/// 4. One entry per player per round: the entry PDA is keyed by round and
///    player, so a second `init` in the same round fails
/// 5. Verifies the treasury received exactly the stake
pub fn enter_lottery(
    ctx: Context<EnterLottery>,
    numbers: [u8; PICK_COUNT],
    stake: u64,
) -> Result<()> {
    require!(stake == ctx.accounts.config.stake, LottoError::StakeMismatch);
    check_numbers(&numbers)?;

    require!(
        ctx.accounts.player.lamports() >= stake,
        LottoError::InsufficientFunds,
    );

    let entry = &mut ctx.accounts.entry;
    entry.player = ctx.accounts.player.key();
    entry.round = ctx.accounts.config.round;
    entry.numbers = numbers;
    entry.bump = ctx.bumps.entry;

    ctx.accounts.config.entries = ctx
        .accounts
        .config
        .entries
        .checked_add(1)
        .ok_or(LottoError::Overflow)?;

    let pre_transfer_balance = ctx.accounts.treasury.to_account_info().lamports();

    anchor_lang::solana_program::program::invoke(
        &anchor_lang::solana_program::system_instruction::transfer(
            &ctx.accounts.player.key(),
            &ctx.accounts.treasury.key(),
            stake,
        ),
        &[
            ctx.accounts.player.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.treasury.to_account_info(),
        ],
    )?;

    let post_transfer_balance = ctx.accounts.treasury.to_account_info().lamports();
    require!(
        post_transfer_balance
            == pre_transfer_balance
                .checked_add(stake)
                .ok_or(LottoError::Overflow)?,
        LottoError::TransferFailed
    );

    emit!(LotteryEntered {
        player: entry.player,
        round: entry.round,
        numbers,
        stake,
    });

    Ok(())
}

/// Every number in range and none repeated.
pub fn check_numbers(numbers: &[u8; PICK_COUNT]) -> Result<()> {
    for (i, n) in numbers.iter().enumerate() {
        require!(
            (MIN_NUMBER..=MAX_NUMBER).contains(n),
            LottoError::NumberOutOfRange
        );
        require!(!numbers[..i].contains(n), LottoError::DuplicateNumber);
    }
    Ok(())
}

/// Accounts required for the enter_lottery instruction
#[derive(Accounts)]
pub struct EnterLottery<'info> {
    #[account(
        mut,
        seeds = [CONFIG_SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, Config>,

    /// New entry for this player in the current round
    /// PDA with seeds ["entry", round, player]
    #[account(
        init,
        payer = player,
        space = ENTRY_ACCOUNT_SIZE,
        seeds = [
            ENTRY_SEED,
            config.round.to_le_bytes().as_ref(),
            player.key().as_ref()
        ],
        bump,
    )]
    pub entry: Account<'info, Entry>,

    /// Receives the stake
    #[account(
        mut,
        seeds = [TREASURY_SEED],
        bump = treasury.bump,
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(mut)]
    pub player: Signer<'info>,

    pub system_program: Program<'info, System>,
}
