//! Vesting math for linear streams.
//!
//! All amounts round down, so the sum of withdrawals never exceeds the
//! deposited amount however often a recipient withdraws.

/// Cumulative amount vested by `now`, including anything already withdrawn.
pub fn streamed_amount(total_amount: u64, start_time: i64, end_time: i64, now: i64) -> u64 {
    // If the start time is in the future, nothing has vested.
    if now < start_time {
        return 0;
    }

    // If the end time is not in the future, everything has vested.
    if now >= end_time {
        return total_amount;
    }

    // start_time <= now < end_time, so both differences are positive and
    // elapsed < duration keeps the quotient below total_amount.
    let elapsed = (now as i128 - start_time as i128) as u128;
    let duration = (end_time as i128 - start_time as i128) as u128;

    (total_amount as u128 * elapsed / duration) as u64
}

/// Amount the recipient may withdraw at `now`.
pub fn vested_withdrawable(
    total_amount: u64,
    withdrawn_amount: u64,
    start_time: i64,
    end_time: i64,
    now: i64,
) -> u64 {
    streamed_amount(total_amount, start_time, end_time, now).saturating_sub(withdrawn_amount)
}
