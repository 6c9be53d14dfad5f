use anchor_lang::error_code;

#[error_code]
pub enum LottoError {
    Overflow,
    InsufficientFunds,
    #[msg("Entry stake must be greater than zero")]
    StakeTooLow,
    #[msg("Stake does not match the configured entry stake")]
    StakeMismatch,
    #[msg("Lottery numbers must be between 1 and 49")]
    NumberOutOfRange,
    #[msg("Lottery numbers must be distinct")]
    DuplicateNumber,
    #[msg("Only the contract owner can reset the lottery")]
    NotOwner,
    #[msg("Treasury transfer failed")]
    TransferFailed,
}
