// crates/harvest-economics/src/emission.rs
//
// Stepped emission schedule for the pool allocator.
//
// The schedule is a list of (start_offset, rewards_per_second) points with
// strictly increasing offsets, measured in seconds since the allocator was
// started. The active rate is that of the greatest offset <= elapsed time;
// before the first offset nothing is emitted. The final point must carry a
// zero rate so total emission is bounded.
//
// Emission over an interval is integrated segment by segment, so any number
// of rate boundaries inside the interval is resolved from elapsed time alone.

use serde::{Deserialize, Serialize};

use harvest_core::math::add;
use harvest_core::HarvestError;

/// One step of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionPoint {
    /// Seconds after `start` at which this rate takes effect.
    pub start_offset: u64,
    pub rewards_per_second: u128,
}

/// Validated stepped emission schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    points: Vec<EmissionPoint>,
}

impl EmissionSchedule {
    /// Build a schedule from its points.
    ///
    /// # Errors
    /// Returns `HarvestError::InvalidState` if the list is empty, the offsets
    /// are not strictly increasing, or the final rate is not zero.
    pub fn new(points: Vec<EmissionPoint>) -> Result<Self, HarvestError> {
        let Some(last) = points.last() else {
            return Err(HarvestError::InvalidState(
                "emission schedule is empty".to_string(),
            ));
        };
        if last.rewards_per_second != 0 {
            return Err(HarvestError::InvalidState(
                "emission schedule must end with a zero rate".to_string(),
            ));
        }
        if points
            .windows(2)
            .any(|pair| pair[0].start_offset >= pair[1].start_offset)
        {
            return Err(HarvestError::InvalidState(
                "emission schedule offsets must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { points })
    }

    /// Build a schedule from the total amount to emit in each period.
    ///
    /// Period `i` runs from `offsets[i]` to `offsets[i + 1]` and emits
    /// `totals[i] / period_length` per second. The final offset gets a zero
    /// rate, so `totals` must be one shorter than `offsets`.
    pub fn from_period_totals(offsets: &[u64], totals: &[u128]) -> Result<Self, HarvestError> {
        if offsets.len() != totals.len() + 1 {
            return Err(HarvestError::InvalidState(format!(
                "{} period totals need {} offsets, got {}",
                totals.len(),
                totals.len() + 1,
                offsets.len()
            )));
        }
        let mut points = Vec::with_capacity(offsets.len());
        for (window, total) in offsets.windows(2).zip(totals) {
            let length = window[1].checked_sub(window[0]).filter(|len| *len > 0).ok_or_else(|| {
                HarvestError::InvalidState(
                    "emission schedule offsets must be strictly increasing".to_string(),
                )
            })?;
            points.push(EmissionPoint {
                start_offset: window[0],
                rewards_per_second: total / length as u128,
            });
        }
        if let Some(last) = offsets.last() {
            points.push(EmissionPoint {
                start_offset: *last,
                rewards_per_second: 0,
            });
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[EmissionPoint] {
        &self.points
    }

    /// Rate in effect `elapsed` seconds after start.
    pub fn rate_at(&self, elapsed: u64) -> u128 {
        let active = self.points.partition_point(|p| p.start_offset <= elapsed);
        match active {
            0 => 0,
            n => self.points[n - 1].rewards_per_second,
        }
    }

    /// Total emitted between `from` and `to` seconds after start.
    pub fn emission_between(&self, from: u64, to: u64) -> Result<u128, HarvestError> {
        if to <= from {
            return Ok(0);
        }
        let mut total: u128 = 0;
        for (i, point) in self.points.iter().enumerate() {
            let segment_end = self
                .points
                .get(i + 1)
                .map_or(u64::MAX, |next| next.start_offset);
            let lo = from.max(point.start_offset);
            let hi = to.min(segment_end);
            if hi <= lo || point.rewards_per_second == 0 {
                continue;
            }
            let emitted = ((hi - lo) as u128)
                .checked_mul(point.rewards_per_second)
                .ok_or(HarvestError::Overflow("scheduled emission"))?;
            total = add(total, emitted, "scheduled emission")?;
        }
        Ok(total)
    }

    /// Everything the schedule will ever emit.
    pub fn total_emission(&self) -> Result<u128, HarvestError> {
        match self.points.last() {
            Some(last) => self.emission_between(0, last.start_offset),
            None => Ok(0),
        }
    }
}
