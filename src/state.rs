use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{error::VestingError, math};

/// Registry state stored in the registry PDA
#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryAccount {
    pub is_initialized: bool,
    /// Id handed to the next stream; also the number of streams ever created
    pub next_id: u64,
    pub bump: u8,
}

impl RegistryAccount {
    pub const LEN: usize = 1 + 8 + 1;

    pub fn new(bump: u8) -> Self {
        RegistryAccount {
            is_initialized: true,
            next_id: 0,
            bump,
        }
    }

    /// Hands out the current id and advances the counter.
    pub fn allocate_id(&mut self) -> Result<u64, VestingError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(VestingError::ArithmeticOverflow)?;
        Ok(id)
    }
}

impl Sealed for RegistryAccount {}

impl IsInitialized for RegistryAccount {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    #[default]
    Uninitialized,
    Active,
    Cancelled,
    Completed,
}

/// Stream state stored in the stream PDA
#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamAccount {
    pub status: StreamStatus,
    pub id: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub total_amount: u64,
    pub withdrawn_amount: u64,
    /// Lamports above rent still held by the stream account
    pub escrowed_amount: u64,
    /// Lamports returned to the sender on cancel
    pub refunded_amount: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub bump: u8,
}

/// How a cancelled stream's escrow was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub vested: u64,
    pub refund: u64,
}

impl Sealed for StreamAccount {}

impl IsInitialized for StreamAccount {
    fn is_initialized(&self) -> bool {
        self.status != StreamStatus::Uninitialized
    }
}

impl StreamAccount {
    pub const LEN: usize = 1 + 8 + 32 + 32 + 8 * 4 + 8 * 2 + 1;

    /// Builds a new active stream that starts at `now`.
    pub fn open(
        id: u64,
        sender: Pubkey,
        recipient: Pubkey,
        amount: u64,
        duration_seconds: u64,
        now: i64,
        bump: u8,
    ) -> Result<Self, VestingError> {
        if duration_seconds == 0 {
            return Err(VestingError::InvalidDuration);
        }
        let end_time = i64::try_from(duration_seconds)
            .ok()
            .and_then(|duration| now.checked_add(duration))
            .ok_or(VestingError::InvalidDuration)?;

        if amount == 0 {
            return Err(VestingError::InvalidAmount);
        }

        Ok(StreamAccount {
            status: StreamStatus::Active,
            id,
            sender,
            recipient,
            total_amount: amount,
            withdrawn_amount: 0,
            escrowed_amount: amount,
            refunded_amount: 0,
            start_time: now,
            end_time,
            bump,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.status == StreamStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == StreamStatus::Cancelled
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_cancelled()
    }

    pub fn withdrawable_amount(&self, now: i64) -> u64 {
        math::vested_withdrawable(
            self.total_amount,
            self.withdrawn_amount,
            self.start_time,
            self.end_time,
            now,
        )
    }

    /// Withdrawable amount as reported to clients: zero once terminal.
    pub fn withdrawable_amount_of(&self, now: i64) -> u64 {
        if self.status != StreamStatus::Active {
            return 0;
        }
        self.withdrawable_amount(now)
    }

    /// What the sender would get back by cancelling at `now`.
    pub fn refundable_amount(&self, now: i64) -> u64 {
        if self.status != StreamStatus::Active {
            return 0;
        }
        self.escrowed_amount
            .saturating_sub(self.withdrawable_amount(now))
    }

    fn ensure_active(&self) -> Result<(), VestingError> {
        match self.status {
            StreamStatus::Active => Ok(()),
            StreamStatus::Cancelled => Err(VestingError::AlreadyCancelled),
            StreamStatus::Completed => Err(VestingError::AlreadyCompleted),
            StreamStatus::Uninitialized => Err(VestingError::StreamNotFound),
        }
    }

    /// Moves everything vested so far out of escrow and returns the amount
    /// owed to the recipient. The record is untouched on error.
    pub fn withdraw(&mut self, caller: &Pubkey, now: i64) -> Result<u64, VestingError> {
        if *caller != self.recipient {
            return Err(VestingError::NotAuthorized);
        }
        self.ensure_active()?;

        let available = self.withdrawable_amount(now);
        if available == 0 {
            return Err(VestingError::NoFundsAvailable);
        }

        let withdrawn_amount = self
            .withdrawn_amount
            .checked_add(available)
            .ok_or(VestingError::ArithmeticOverflow)?;
        let escrowed_amount = self
            .escrowed_amount
            .checked_sub(available)
            .ok_or(VestingError::EscrowShortfall)?;

        self.withdrawn_amount = withdrawn_amount;
        self.escrowed_amount = escrowed_amount;
        if self.withdrawn_amount == self.total_amount {
            self.status = StreamStatus::Completed;
        }

        Ok(available)
    }

    /// Splits the escrow between recipient (vested) and sender (the rest)
    /// and closes the stream for good. The record is untouched on error.
    pub fn cancel(&mut self, caller: &Pubkey, now: i64) -> Result<Settlement, VestingError> {
        if *caller != self.sender {
            return Err(VestingError::NotAuthorized);
        }
        self.ensure_active()?;

        let vested = self.withdrawable_amount(now);
        let refund = self
            .escrowed_amount
            .checked_sub(vested)
            .ok_or(VestingError::EscrowShortfall)?;
        let withdrawn_amount = self
            .withdrawn_amount
            .checked_add(vested)
            .ok_or(VestingError::ArithmeticOverflow)?;

        self.withdrawn_amount = withdrawn_amount;
        self.refunded_amount = refund;
        self.escrowed_amount = 0;
        self.status = StreamStatus::Cancelled;

        Ok(Settlement { vested, refund })
    }
}
