use thiserror::Error;

use solana_program::program_error::ProgramError;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum VestingError {
    /// Stream duration must be positive and end before the clock overflows
    #[error("Invalid stream duration")]
    InvalidDuration,
    #[error("Invalid stream amount")]
    InvalidAmount,
    #[error("Insufficient balance to fund stream")]
    InsufficientBalance,
    #[error("Stream not found")]
    StreamNotFound,
    #[error("Caller is not authorized for this stream")]
    NotAuthorized,
    #[error("Stream already cancelled")]
    AlreadyCancelled,
    #[error("Stream already completed")]
    AlreadyCompleted,
    #[error("No vested funds available")]
    NoFundsAvailable,
    #[error("Registry not initialized")]
    NotInitialized,
    /// Escrow holds less than the amount being released
    #[error("Escrow balance too low")]
    EscrowShortfall,
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<VestingError> for ProgramError {
    fn from(e: VestingError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
