use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

use crate::constants::events::EVENT_TAG;

/// Audit record for every successful transition.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Created {
        stream_id: u64,
        sender: Pubkey,
        recipient: Pubkey,
        total_amount: u64,
        start_time: i64,
        end_time: i64,
    },
    Withdrawn {
        stream_id: u64,
        recipient: Pubkey,
        amount: u64,
        timestamp: i64,
    },
    Cancelled {
        stream_id: u64,
        sender: Pubkey,
        refunded_amount: u64,
        timestamp: i64,
    },
}

impl StreamEvent {
    pub fn stream_id(&self) -> u64 {
        match self {
            StreamEvent::Created { stream_id, .. }
            | StreamEvent::Withdrawn { stream_id, .. }
            | StreamEvent::Cancelled { stream_id, .. } => *stream_id,
        }
    }

    /// Decodes the payload of a `Program data:` log record written by [`emit`].
    pub fn from_log_data(chunks: &[&[u8]]) -> Option<Self> {
        match chunks {
            [tag, payload] if *tag == EVENT_TAG => StreamEvent::try_from_slice(payload).ok(),
            _ => None,
        }
    }
}

pub fn emit(event: &StreamEvent) -> Result<(), ProgramError> {
    msg!("[Vesting] Event {:?}", event);
    let payload =
        borsh::to_vec(event).map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
    sol_log_data(&[EVENT_TAG, payload.as_slice()]);
    Ok(())
}
