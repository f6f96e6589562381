//! Read-only helpers for clients holding raw account data.

use borsh::BorshDeserialize;
use solana_program::{program_error::ProgramError, program_pack::IsInitialized, pubkey::Pubkey};

use crate::{
    constants::seeds,
    error::VestingError,
    state::{RegistryAccount, StreamAccount, StreamStatus},
};

pub fn find_registry_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::REGISTRY], program_id)
}

pub fn find_stream_address(program_id: &Pubkey, stream_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::STREAM, &stream_id.to_le_bytes()], program_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub total_amount: u64,
    pub withdrawn_amount: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub status: StreamStatus,
}

impl From<&StreamAccount> for StreamInfo {
    fn from(stream: &StreamAccount) -> Self {
        StreamInfo {
            sender: stream.sender,
            recipient: stream.recipient,
            total_amount: stream.total_amount,
            withdrawn_amount: stream.withdrawn_amount,
            start_time: stream.start_time,
            end_time: stream.end_time,
            status: stream.status,
        }
    }
}

/// Decodes stream account data, failing on empty or never-written accounts.
pub fn load_stream(data: &[u8]) -> Result<StreamAccount, ProgramError> {
    if data.len() != StreamAccount::LEN {
        return Err(VestingError::StreamNotFound.into());
    }
    let stream =
        StreamAccount::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)?;
    if !stream.is_initialized() {
        return Err(VestingError::StreamNotFound.into());
    }
    Ok(stream)
}

pub fn load_registry(data: &[u8]) -> Result<RegistryAccount, ProgramError> {
    if data.len() != RegistryAccount::LEN {
        return Err(VestingError::NotInitialized.into());
    }
    let registry =
        RegistryAccount::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)?;
    if !registry.is_initialized() {
        return Err(VestingError::NotInitialized.into());
    }
    Ok(registry)
}

pub fn get_stream(data: &[u8]) -> Result<StreamInfo, ProgramError> {
    Ok(StreamInfo::from(&load_stream(data)?))
}

pub fn get_withdrawable_amount(data: &[u8], now: i64) -> Result<u64, ProgramError> {
    Ok(load_stream(data)?.withdrawable_amount_of(now))
}

pub fn get_total_streams(registry_data: &[u8]) -> Result<u64, ProgramError> {
    Ok(load_registry(registry_data)?.next_id)
}
