//! Custody of streamed lamports.
//!
//! A stream's escrow is the lamport balance of its program-owned account
//! above the rent-exempt minimum. Funds only leave through [`Escrow::extract`].

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program_error::ProgramError,
    rent::Rent,
};

use crate::error::VestingError;

pub struct Escrow<'a, 'info> {
    account: &'a AccountInfo<'info>,
    reserve: u64,
}

impl<'a, 'info> Escrow<'a, 'info> {
    pub fn new(account: &'a AccountInfo<'info>, rent: &Rent) -> Self {
        Escrow {
            account,
            reserve: rent.minimum_balance(account.data_len()),
        }
    }

    /// Lamports available for release.
    pub fn balance(&self) -> u64 {
        self.account.lamports().saturating_sub(self.reserve)
    }

    /// Moves `amount` lamports from escrow into `dest`.
    pub fn extract(&self, amount: u64, dest: &AccountInfo<'info>) -> ProgramResult {
        if amount > self.balance() {
            msg!(
                "[Vesting] Escrow holds {} but {} was requested",
                self.balance(),
                amount
            );
            return Err(VestingError::EscrowShortfall.into());
        }
        if amount == 0 {
            return Ok(());
        }

        let credited = dest
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::from(VestingError::ArithmeticOverflow))?;

        **self.account.try_borrow_mut_lamports()? -= amount;
        **dest.try_borrow_mut_lamports()? = credited;

        Ok(())
    }
}
