//! Linear vesting streams.
//!
//! A sender locks lamports for a recipient in a program-owned stream account.
//! The recipient withdraws whatever has vested so far and the sender may
//! cancel early, splitting the escrow between both parties.

pub mod constants;
pub mod entrypoint;
pub mod error;
pub mod escrow;
pub mod events;
pub mod instruction;
pub mod math;
pub mod processor;
pub mod query;
pub mod state;
