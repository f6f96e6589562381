use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::query::{find_registry_address, find_stream_address};

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum VestingInstruction {
    /// Create the stream registry. Does nothing if it already exists.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer for the registry account
    /// 1. `[writable]` Registry PDA
    /// 2. `[]` System program account
    Initialize,

    /// Lock `amount` lamports for `recipient`, vesting linearly over
    /// `duration_seconds` from now.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Sender account funding the stream
    /// 1. `[writable]` Registry PDA
    /// 2. `[writable]` Stream PDA for the registry's next id
    /// 3. `[]` System program account
    Create {
        recipient: Pubkey,
        amount: u64,
        duration_seconds: u64,
    },

    /// Withdraw everything vested so far
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Recipient account
    /// 1. `[writable]` Stream PDA
    Withdraw { stream_id: u64 },

    /// Cancel a stream, paying the vested share to the recipient and
    /// refunding the rest to the sender
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Sender account
    /// 1. `[writable]` Recipient account
    /// 2. `[writable]` Stream PDA
    Cancel { stream_id: u64 },

    /// Return data: withdrawable amount as u64 LE
    ///
    /// Accounts expected:
    /// 0. `[]` Stream PDA
    WithdrawableAmountOf { stream_id: u64 },

    /// Return data: refundable amount as u64 LE
    ///
    /// Accounts expected:
    /// 0. `[]` Stream PDA
    RefundableAmountOf { stream_id: u64 },

    /// Return data: number of streams ever created as u64 LE
    ///
    /// Accounts expected:
    /// 0. `[]` Registry PDA
    TotalStreams,
}

impl VestingInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => Self::Initialize,
            1 => {
                let recipient = rest
                    .get(..32)
                    .and_then(|slice| Pubkey::try_from(slice).ok())
                    .ok_or(ProgramError::InvalidInstructionData)?;
                let amount = Self::unpack_u64(rest, 32)?;
                let duration_seconds = Self::unpack_u64(rest, 40)?;

                Self::Create {
                    recipient,
                    amount,
                    duration_seconds,
                }
            }
            2 => Self::Withdraw {
                stream_id: Self::unpack_u64(rest, 0)?,
            },
            3 => Self::Cancel {
                stream_id: Self::unpack_u64(rest, 0)?,
            },
            4 => Self::WithdrawableAmountOf {
                stream_id: Self::unpack_u64(rest, 0)?,
            },
            5 => Self::RefundableAmountOf {
                stream_id: Self::unpack_u64(rest, 0)?,
            },
            6 => Self::TotalStreams,
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    fn unpack_u64(input: &[u8], start: usize) -> Result<u64, ProgramError> {
        let value = input
            .get(start..8 + start)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok(value)
    }

    fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        borsh::to_vec(self).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Initialize instruction
pub fn initialize(program_id: Pubkey, payer: Pubkey) -> Result<Instruction, ProgramError> {
    let (registry, _) = find_registry_address(&program_id);
    let accounts = vec![
        AccountMeta::new(payer, true),
        AccountMeta::new(registry, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id,
        accounts,
        data: VestingInstruction::Initialize.pack()?,
    })
}

/// Create instruction. `stream_id` must be the registry's current `next_id`.
pub fn create_stream(
    program_id: Pubkey,
    sender: Pubkey,
    recipient: Pubkey,
    stream_id: u64,
    amount: u64,
    duration_seconds: u64,
) -> Result<Instruction, ProgramError> {
    let (registry, _) = find_registry_address(&program_id);
    let (stream, _) = find_stream_address(&program_id, stream_id);
    let data = VestingInstruction::Create {
        recipient,
        amount,
        duration_seconds,
    }
    .pack()?;
    let accounts = vec![
        AccountMeta::new(sender, true),
        AccountMeta::new(registry, false),
        AccountMeta::new(stream, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

pub fn withdraw(
    program_id: Pubkey,
    recipient: Pubkey,
    stream_id: u64,
) -> Result<Instruction, ProgramError> {
    let (stream, _) = find_stream_address(&program_id, stream_id);
    let accounts = vec![
        AccountMeta::new(recipient, true),
        AccountMeta::new(stream, false),
    ];

    Ok(Instruction {
        program_id,
        accounts,
        data: VestingInstruction::Withdraw { stream_id }.pack()?,
    })
}

pub fn cancel(
    program_id: Pubkey,
    sender: Pubkey,
    recipient: Pubkey,
    stream_id: u64,
) -> Result<Instruction, ProgramError> {
    let (stream, _) = find_stream_address(&program_id, stream_id);
    let accounts = vec![
        AccountMeta::new(sender, true),
        AccountMeta::new(recipient, false),
        AccountMeta::new(stream, false),
    ];

    Ok(Instruction {
        program_id,
        accounts,
        data: VestingInstruction::Cancel { stream_id }.pack()?,
    })
}

pub fn withdrawable_amount_of(
    program_id: Pubkey,
    stream_id: u64,
) -> Result<Instruction, ProgramError> {
    let (stream, _) = find_stream_address(&program_id, stream_id);

    Ok(Instruction {
        program_id,
        accounts: vec![AccountMeta::new_readonly(stream, false)],
        data: VestingInstruction::WithdrawableAmountOf { stream_id }.pack()?,
    })
}

pub fn refundable_amount_of(
    program_id: Pubkey,
    stream_id: u64,
) -> Result<Instruction, ProgramError> {
    let (stream, _) = find_stream_address(&program_id, stream_id);

    Ok(Instruction {
        program_id,
        accounts: vec![AccountMeta::new_readonly(stream, false)],
        data: VestingInstruction::RefundableAmountOf { stream_id }.pack()?,
    })
}

pub fn total_streams(program_id: Pubkey) -> Result<Instruction, ProgramError> {
    let (registry, _) = find_registry_address(&program_id);

    Ok(Instruction {
        program_id,
        accounts: vec![AccountMeta::new_readonly(registry, false)],
        data: VestingInstruction::TotalStreams.pack()?,
    })
}
