//! 确定性变更生成器
//!
//! Same seed, same change sequence.

use contracts::channels;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every `BURST_EVERY` ticks every channel changes at once, like a login or
/// a zone transition.
const BURST_EVERY: u64 = 120;

/// Roughly one change in `CRITICAL_ONE_IN` is flagged critical.
const CRITICAL_ONE_IN: u32 = 50;

/// At most this many single changes per regular tick.
const MAX_CHANGES_PER_TICK: usize = 3;

/// One synthetic "channel changed" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub channel: &'static str,
    pub payload: u64,
    pub critical: bool,
}

/// Emits pseudo-random changes over the reference channels
///
/// Same seed, same sequence.
#[derive(Debug, Clone)]
pub struct SyntheticProducer {
    rng: StdRng,
    sequence: u64,
}

impl SyntheticProducer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    /// Changes observed during frame `tick`
    pub fn changes(&mut self, tick: u64) -> Vec<Change> {
        if tick % BURST_EVERY == 0 {
            return channels::ALL
                .iter()
                .map(|&channel| self.change(channel, false))
                .collect();
        }

        let count = self.rng.random_range(0..=MAX_CHANGES_PER_TICK);
        (0..count)
            .map(|_| {
                let idx = self.rng.random_range(0..channels::ALL.len());
                let critical = self.rng.random_ratio(1, CRITICAL_ONE_IN);
                self.change(channels::ALL[idx], critical)
            })
            .collect()
    }

    fn change(&mut self, channel: &'static str, critical: bool) -> Change {
        self.sequence += 1;
        Change {
            channel,
            payload: self.sequence,
            critical,
        }
    }
}
