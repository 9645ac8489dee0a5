//! Weight-proportional split of destinations across days.

use log::debug;

use crate::error::ConfigError;

/// Result of distributing destinations over days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Target count per day after remainder correction (may be negative)
    pub targets: Vec<i64>,
    /// Contiguous chunks of the input names, one per day
    pub days: Vec<Vec<String>>,
}

impl Allocation {
    /// Indices of days with a positive target.
    pub fn active_days(&self) -> Vec<usize> {
        self.targets
            .iter()
            .enumerate()
            .filter(|(_, &t)| t > 0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Implements the proportional day allocator.
pub struct DayAllocator;

impl DayAllocator {
    /// Compute per-day targets for `total` items under `weights`.
    ///
    /// Each target is `total * w / sum(w)` rounded half to even. The leftover
    /// is then spread one unit at a time over days `0, 1, 2, ...` (wrapping),
    /// adding when short and subtracting when over.
    pub fn targets(total: usize, weights: &[u32]) -> Result<Vec<i64>, ConfigError> {
        let weight_sum: u64 = weights.iter().map(|&w| w as u64).sum();
        if weight_sum == 0 {
            return Err(ConfigError::ZeroWeightSum);
        }

        let mut targets: Vec<i64> = weights
            .iter()
            .map(|&w| (total as f64 * w as f64 / weight_sum as f64).round_ties_even() as i64)
            .collect();

        let mut remainder = total as i64 - targets.iter().sum::<i64>();
        let step = remainder.signum();
        let n = targets.len();
        let mut j = 0;

        while remainder != 0 {
            targets[j % n] += step;
            remainder -= step;
            j += 1;
        }

        Ok(targets)
    }

    /// Slice `names` into contiguous per-day chunks sized by [`Self::targets`].
    ///
    /// No spatial information is used here; days with a target of zero or
    /// less receive an empty chunk.
    pub fn allocate(names: &[String], weights: &[u32]) -> Result<Allocation, ConfigError> {
        let targets = Self::targets(names.len(), weights)?;

        let mut offset = 0;
        let days = targets
            .iter()
            .map(|&t| {
                let take = (t.max(0) as usize).min(names.len() - offset);
                let chunk = names[offset..offset + take].to_vec();
                offset += take;
                chunk
            })
            .collect();

        debug!("allocated {} destinations with targets {:?}", names.len(), targets);

        Ok(Allocation { targets, days })
    }
}
