//! Difficulty retargeting against metronome beats
//!
//! Three policies are dispatched by height through a [`RetargetSchedule`]:
//! the legacy timespan retarget, the beat-relative sampled average (every
//! 32nd block, later every block), and a one-shot big-jump correction.

use crate::errors::RetargetError;
use crate::pow::Target;
use consensus_core::config::Params;
use consensus_core::Hash;
use metronome::BeatSource;
use primitive_types::{U256, U512};

/// The fields of a confirmed block that retargeting reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIndex {
    pub height: u64,
    pub hash: Hash,
    pub time: i64,
    pub bits: u32,
    pub beat_hash: Hash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetargetPolicy {
    /// Elapsed time over the adjustment interval, against `timespan`
    Legacy { timespan: i64 },
    /// Clamped average of beat-relative mining time over `window` blocks,
    /// sampling every `sampling_period`th block
    BeatSampled { sampling_period: u64, window: u64, spacing: i64 },
    /// Fixed one-unit mining time against `spacing`
    BigJump { spacing: i64 },
}

/// A policy and its adjustment interval, active from `start_height` on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Regime {
    pub start_height: u64,
    pub adjustment_interval: u64,
    pub policy: RetargetPolicy,
}

/// Height-range lookup table of retarget regimes
#[derive(Clone, Debug)]
pub struct RetargetSchedule {
    base: Regime,
    forks: Vec<Regime>,
    one_shots: Vec<(u64, RetargetPolicy)>,
}

impl RetargetSchedule {
    pub fn from_params(params: &Params) -> Self {
        let base = Regime {
            start_height: 0,
            adjustment_interval: params.difficulty_adjustment_interval(),
            policy: RetargetPolicy::Legacy { timespan: params.pow_target_timespan },
        };
        let forks = vec![
            Regime {
                start_height: params.hf2_height + 1,
                adjustment_interval: params.le_adjustment_interval,
                policy: RetargetPolicy::BeatSampled {
                    sampling_period: 32,
                    window: params.miner_confirmation_window,
                    spacing: params.pow_target_mining_spacing,
                },
            },
            Regime {
                start_height: params.hf4_height + 1,
                adjustment_interval: params.hf4_adjustment_interval,
                policy: RetargetPolicy::BeatSampled {
                    sampling_period: 1,
                    window: params.miner_confirmation_window_hf4,
                    spacing: params.pow_target_mining_spacing_hf4,
                },
            },
        ];
        let one_shots = vec![(params.hf3_height, RetargetPolicy::BigJump { spacing: params.pow_target_mining_spacing })];

        Self { base, forks, one_shots }
    }

    /// Regime governing a block at `height`
    pub fn regime_for(&self, height: u64) -> &Regime {
        self.forks.iter().rev().find(|r| height >= r.start_height).unwrap_or(&self.base)
    }

    pub fn one_shot_at(&self, height: u64) -> Option<RetargetPolicy> {
        self.one_shots.iter().find(|(h, _)| *h == height).map(|(_, policy)| *policy)
    }

    pub fn adjustment_interval(&self, height: u64) -> u64 {
        self.regime_for(height).adjustment_interval.max(1)
    }
}

/// One `(blockTime, beatTime, prevBlockTime)` observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiningSample {
    pub block_time: i64,
    pub beat_time: i64,
    pub prev_block_time: i64,
}

impl MiningSample {
    /// Time from the later of the beat and the parent block to this block
    pub fn mining_time(&self) -> i64 {
        (self.block_time - self.beat_time).min(self.block_time - self.prev_block_time)
    }
}

pub fn clamp_sample(mining_time: i64, spacing: i64) -> i64 {
    mining_time.max(spacing / 4).min(spacing * 4)
}

/// Integer average of clamped samples; never zero
pub fn average_mining_time(samples: &[MiningSample], spacing: i64) -> i64 {
    if samples.is_empty() {
        return 1;
    }
    let total: i64 = samples.iter().map(|s| clamp_sample(s.mining_time(), spacing)).sum();
    match total / samples.len() as i64 {
        0 => 1,
        avg => avg,
    }
}

/// `old * actual / expected`, capped at `pow_limit`
pub fn retarget(old_bits: u32, actual: i64, expected: i64, pow_limit: U256) -> u32 {
    let old = Target::from_bits(old_bits).as_u256();
    let product = old.full_mul(U256::from(actual.max(0) as u64));
    let scaled = product / U512::from(expected.max(1) as u64);

    let new = if scaled > U512::from(pow_limit) {
        pow_limit
    } else {
        U256::try_from(scaled).unwrap_or(pow_limit)
    };
    Target::new(new).to_bits()
}

/// Computes the compact target required of the block after a chain tip
pub struct DifficultyManager {
    params: Params,
    schedule: RetargetSchedule,
}

impl DifficultyManager {
    pub fn new(params: Params) -> Self {
        let schedule = RetargetSchedule::from_params(&params);
        Self { params, schedule }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn pow_limit_bits(&self) -> u32 {
        Target::new(self.params.pow_limit).to_bits()
    }

    /// `history` is a contiguous run of confirmed blocks ending at the tip,
    /// long enough to cover the active regime's window.
    pub fn next_work_required(
        &self,
        history: &[BlockIndex],
        candidate_time: i64,
        beats: &dyn BeatSource,
    ) -> Result<u32, RetargetError> {
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
        let next_height = tip.height + 1;

        if let Some(policy) = self.schedule.one_shot_at(next_height) {
            return self.apply(policy, history, beats);
        }

        if next_height % self.schedule.adjustment_interval(next_height) != 0 {
            if self.params.pow_allow_min_difficulty_blocks {
                return Ok(self.min_difficulty_bits(history, candidate_time));
            }
            return Ok(tip.bits);
        }

        self.apply(self.schedule.regime_for(next_height).policy, history, beats)
    }

    /// Bits a candidate on top of `tip` drops to once its timestamp passes
    /// the min-difficulty delay. `None` where that rule does not govern the
    /// next height or the delay has not passed.
    pub fn relaxed_bits(&self, tip: &BlockIndex, candidate_time: i64) -> Option<u32> {
        let next_height = tip.height + 1;
        if !self.params.pow_allow_min_difficulty_blocks
            || self.schedule.one_shot_at(next_height).is_some()
            || next_height % self.schedule.adjustment_interval(next_height) == 0
        {
            return None;
        }
        (candidate_time > tip.time + self.params.pow_target_spacing * 2).then(|| self.pow_limit_bits())
    }

    fn apply(&self, policy: RetargetPolicy, history: &[BlockIndex], beats: &dyn BeatSource) -> Result<u32, RetargetError> {
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
        if self.params.pow_no_retargeting {
            return Ok(tip.bits);
        }

        match policy {
            RetargetPolicy::Legacy { timespan } => self.legacy(history, timespan),
            RetargetPolicy::BeatSampled { sampling_period, window, spacing } => {
                self.beat_sampled(history, sampling_period, window, spacing, beats)
            }
            RetargetPolicy::BigJump { spacing } => {
                log::info!("New difficulty: avg=1s, target={}s (one-shot)", spacing);
                Ok(retarget(tip.bits, 1, spacing, self.params.pow_limit))
            }
        }
    }

    fn legacy(&self, history: &[BlockIndex], timespan: i64) -> Result<u32, RetargetError> {
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
        let interval = self.schedule.base.adjustment_interval;
        let missing = RetargetError::InsufficientHistory { height: tip.height + 1, missing: 0 };
        let first_height = tip.height.checked_sub(interval - 1).ok_or(missing)?;
        let first = ancestor(history, first_height)?;

        let actual = (tip.time - first.time).max(timespan / 4).min(timespan * 4);
        Ok(retarget(tip.bits, actual, timespan, self.params.pow_limit))
    }

    fn beat_sampled(
        &self,
        history: &[BlockIndex],
        sampling_period: u64,
        window: u64,
        spacing: i64,
        beats: &dyn BeatSource,
    ) -> Result<u32, RetargetError> {
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;

        let mut samples = Vec::new();
        for i in (0..window).step_by(sampling_period.max(1) as usize) {
            let height = tip.height.checked_sub(i).ok_or(RetargetError::InsufficientHistory {
                height: tip.height + 1,
                missing: 0,
            })?;
            let block = ancestor(history, height)?;
            let prev_height = height.checked_sub(1).ok_or(RetargetError::InsufficientHistory {
                height: tip.height + 1,
                missing: 0,
            })?;
            let prev = ancestor(history, prev_height)?;

            let beat = beats.fetch_beat(&block.beat_hash)?.ok_or(RetargetError::MissingBeat {
                height: block.height,
                block: block.hash,
                beat: block.beat_hash,
            })?;

            samples.push(MiningSample { block_time: block.time, beat_time: beat.block_time, prev_block_time: prev.time });
        }

        let avg = average_mining_time(&samples, spacing);
        log::info!("New difficulty: avg={}s, target={}s over {} samples", avg, spacing, samples.len());
        Ok(retarget(tip.bits, avg, spacing, self.params.pow_limit))
    }

    /// Test-network rule: a late candidate may use the PoW limit, otherwise
    /// inherit the bits of the last block not mined under that rule
    fn min_difficulty_bits(&self, history: &[BlockIndex], candidate_time: i64) -> u32 {
        let limit_bits = self.pow_limit_bits();
        let Some(tip) = history.last() else {
            return limit_bits;
        };
        if candidate_time > tip.time + self.params.pow_target_spacing * 2 {
            return limit_bits;
        }

        let mut idx = history.len() - 1;
        while idx > 0 {
            let block = &history[idx];
            if block.height % self.schedule.adjustment_interval(block.height) == 0 || block.bits != limit_bits {
                break;
            }
            idx -= 1;
        }
        history[idx].bits
    }
}

/// Block at `height` in a contiguous history ending at the tip
fn ancestor(history: &[BlockIndex], height: u64) -> Result<&BlockIndex, RetargetError> {
    let insufficient = |tip_height: u64| RetargetError::InsufficientHistory { height: tip_height + 1, missing: height };
    let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
    let offset = tip.height.checked_sub(height).ok_or_else(|| insufficient(tip.height))?;
    let index = (history.len() as u64)
        .checked_sub(offset + 1)
        .ok_or_else(|| insufficient(tip.height))?;
    Ok(&history[index as usize])
}
