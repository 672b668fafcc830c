// crates/harvest-economics/src/accumulator.rs
//
// Reward-per-token streaming accumulator.
//
// A notified reward amount is streamed linearly over a fixed duration (one
// epoch by default). The accumulator tracks how much reward one unit of
// weight has earned since the stream was created; each account stores the
// accumulator value it last settled at plus the reward it has accrued but
// not yet claimed.
//
//   reward_per_token = stored + rate * (min(now, period_finish) - last_update) / total_weight
//   earned           = weight * (reward_per_token - paid) + pending
//
// Every division floors, so the sum paid out to all accounts never exceeds
// the sum notified.

use serde::{Deserialize, Serialize};

use harvest_core::math::{add, mul_div};
use harvest_core::{HarvestError, Timestamp};

/// Fixed-point scale of `reward_per_token` values.
pub const REWARD_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Per-account settlement state for one reward stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCheckpoint {
    /// Accumulator value at the account's last settlement.
    pub reward_per_token_paid: u128,
    /// Reward accrued up to the last settlement and not yet paid out.
    pub pending: u128,
}

/// One reward token's streaming state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardStream {
    duration: u64,
    rate: u128,
    period_finish: Timestamp,
    last_update_time: Timestamp,
    reward_per_token_stored: u128,
}

impl RewardStream {
    /// Create an idle stream that streams each notification over `duration` seconds.
    pub fn new(duration: u64, now: Timestamp) -> Self {
        Self {
            duration,
            rate: 0,
            period_finish: now,
            last_update_time: now,
            reward_per_token_stored: 0,
        }
    }

    /// Reward units released per second in the current period.
    pub fn rate(&self) -> u128 {
        self.rate
    }

    /// End of the current streaming period.
    pub fn period_finish(&self) -> Timestamp {
        self.period_finish
    }

    /// Time the stored accumulator was last brought forward to.
    pub fn last_update_time(&self) -> Timestamp {
        self.last_update_time
    }

    /// Accumulator value as of `last_update_time`.
    pub fn reward_per_token_stored(&self) -> u128 {
        self.reward_per_token_stored
    }

    /// Streaming duration applied to every notification.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// `min(now, period_finish)`: rewards stop accruing once the period ends.
    pub fn last_time_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.period_finish)
    }

    /// Total reward released over one full duration at the current rate.
    pub fn reward_for_duration(&self) -> u128 {
        self.rate.saturating_mul(self.duration as u128)
    }

    /// Accumulator value at `now` without mutating state.
    ///
    /// A zero `total_weight` leaves the stored value unchanged; reward released
    /// while nobody holds weight stays undistributed.
    pub fn reward_per_token(&self, total_weight: u128, now: Timestamp) -> Result<u128, HarvestError> {
        if total_weight == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = self
            .last_time_applicable(now)
            .saturating_sub(self.last_update_time) as u128;
        let released = elapsed
            .checked_mul(self.rate)
            .ok_or(HarvestError::Overflow("released reward"))?;
        let accrued = mul_div(released, REWARD_PRECISION, total_weight)?;
        add(self.reward_per_token_stored, accrued, "reward per token")
    }

    /// Bring the stored accumulator forward to `now`.
    pub fn update(&mut self, total_weight: u128, now: Timestamp) -> Result<u128, HarvestError> {
        self.reward_per_token_stored = self.reward_per_token(total_weight, now)?;
        self.last_update_time = self.last_time_applicable(now);
        Ok(self.reward_per_token_stored)
    }

    /// Reward claimable by an account holding `weight` at `now`, without mutating state.
    pub fn earned(
        &self,
        checkpoint: &RewardCheckpoint,
        weight: u128,
        total_weight: u128,
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        let current = self.reward_per_token(total_weight, now)?;
        accrue(checkpoint, weight, current)
    }

    /// Settle an account against the stored accumulator.
    ///
    /// `update` must already have been called for the current moment; the
    /// account's weight must not have changed since its previous settlement.
    pub fn settle(&self, checkpoint: &mut RewardCheckpoint, weight: u128) -> Result<(), HarvestError> {
        checkpoint.pending = accrue(checkpoint, weight, self.reward_per_token_stored)?;
        checkpoint.reward_per_token_paid = self.reward_per_token_stored;
        Ok(())
    }

    /// Start a new streaming period with `amount` of fresh reward.
    ///
    /// The accumulator is brought forward at the old rate first. If the current
    /// period has not finished, its unreleased remainder is folded into the new
    /// rate instead of being lost.
    pub fn notify(&mut self, amount: u128, total_weight: u128, now: Timestamp) -> Result<(), HarvestError> {
        if self.duration == 0 {
            return Err(HarvestError::InvalidState(
                "reward stream has zero duration".to_string(),
            ));
        }
        self.update(total_weight, now)?;

        let total = if now >= self.period_finish {
            amount
        } else {
            let remaining = (self.period_finish - now) as u128;
            let leftover = remaining
                .checked_mul(self.rate)
                .ok_or(HarvestError::Overflow("leftover reward"))?;
            add(amount, leftover, "notified reward")?
        };

        self.rate = total / self.duration as u128;
        self.last_update_time = now;
        self.period_finish = now.saturating_add(self.duration);
        Ok(())
    }
}

fn accrue(checkpoint: &RewardCheckpoint, weight: u128, current: u128) -> Result<u128, HarvestError> {
    let delta = current.saturating_sub(checkpoint.reward_per_token_paid);
    add(
        mul_div(weight, delta, REWARD_PRECISION)?,
        checkpoint.pending,
        "pending reward",
    )
}
