//! Fault-injecting wrapper around [`QueueBus`].
//!
//! Faults are applied on the producer side, at enqueue time, so the consumer
//! sees exactly what a real impaired link would hand it.

use std::collections::HashMap;

use bytes::Bytes;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::Result;
use crate::fault::{ChaosConfig, Fault, FaultPlan};
use crate::queue::QueueBus;
use crate::traits::ByteChannel;

/// Per-name counters of what the bus did to the traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    /// Entries handed to `enqueue`.
    pub sent: u64,
    /// Entries removed by `dequeue`.
    pub delivered: u64,
    /// Entries that never reached the queue.
    pub dropped: u64,
    /// Extra copies queued.
    pub duplicated: u64,
    /// Entries with a flipped bit.
    pub corrupted: u64,
    /// Entries held back behind a later one.
    pub reordered: u64,
}

struct Chaos {
    config: ChaosConfig,
    rng: ChaCha8Rng,
}

#[derive(Default)]
struct Lane {
    plans: Vec<FaultPlan>,
    chaos: Option<Chaos>,
    iteration: u64,
    held: Option<(Bytes, u64)>,
    stats: ChannelStats,
}

/// What the active faults decided for one entry.
#[derive(Default)]
struct Verdict {
    drop: bool,
    copies: u64,
    reorder: bool,
    flips: Vec<(usize, u8)>,
}

/// Named queues that drop, repeat, corrupt or reorder entries on demand.
///
/// Not thread-safe; one instance per test or simulation.
#[derive(Default)]
pub struct FaultyBus {
    inner: QueueBus,
    lanes: HashMap<String, Lane>,
}

impl FaultyBus {
    /// Create a bus with no faults installed. It behaves like [`QueueBus`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fault plan on `name`. Plans accumulate.
    pub fn add_fault(&mut self, name: &str, plan: FaultPlan) -> Result<()> {
        plan.validate(name)?;
        debug!(channel = name, ?plan, "installing fault plan");
        self.lane_mut(name).plans.push(plan);
        Ok(())
    }

    /// Enable seeded random impairments on `name`, replacing any earlier chaos config.
    pub fn set_chaos(&mut self, name: &str, config: ChaosConfig) -> Result<()> {
        config.validate()?;
        debug!(channel = name, ?config, "enabling chaos");
        self.lane_mut(name).chaos = Some(Chaos {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        });
        Ok(())
    }

    /// Remove every plan and chaos config on `name`. Iteration count and stats are kept.
    pub fn remove_faults(&mut self, name: &str) {
        if let Some(lane) = self.lanes.get_mut(name) {
            lane.plans.clear();
            lane.chaos = None;
        }
    }

    /// Remove every plan and chaos config on every name.
    pub fn remove_all_faults(&mut self) {
        for lane in self.lanes.values_mut() {
            lane.plans.clear();
            lane.chaos = None;
        }
    }

    /// Queue an entry held back by a reorder fault, if any.
    pub fn flush(&mut self, name: &str) {
        if let Some((held, count)) = self.lanes.get_mut(name).and_then(|lane| lane.held.take()) {
            for _ in 0..count {
                self.inner.push(name, held.clone());
            }
        }
    }

    /// Counters for `name`.
    pub fn stats(&self, name: &str) -> ChannelStats {
        self.lanes.get(name).map(|lane| lane.stats).unwrap_or_default()
    }

    /// Number of entries enqueued on `name` so far.
    pub fn iteration(&self, name: &str) -> u64 {
        self.lanes.get(name).map_or(0, |lane| lane.iteration)
    }

    /// Borrow the underlying lossless queues.
    pub fn get_ref(&self) -> &QueueBus {
        &self.inner
    }

    /// Consume the bus and return the underlying queues.
    pub fn into_inner(self) -> QueueBus {
        self.inner
    }

    fn lane_mut(&mut self, name: &str) -> &mut Lane {
        self.lanes.entry(name.to_string()).or_default()
    }
}

impl Lane {
    fn judge(&mut self, len: usize) -> Verdict {
        let mut verdict = Verdict::default();
        let iteration = self.iteration;

        for plan in self.plans.iter().filter(|plan| plan.is_active(iteration)) {
            for fault in plan.faults() {
                match *fault {
                    Fault::Drop => verdict.drop = true,
                    Fault::Repeat { copies } => verdict.copies += u64::from(copies),
                    Fault::BitFlip { byte_index, bit } => verdict.flips.push((byte_index, bit)),
                    Fault::Reorder => verdict.reorder = true,
                }
            }
        }

        if let Some(chaos) = self.chaos.as_mut() {
            let rolls: [f64; 4] = [
                chaos.rng.gen(),
                chaos.rng.gen(),
                chaos.rng.gen(),
                chaos.rng.gen(),
            ];
            if rolls[0] < chaos.config.drop_rate {
                verdict.drop = true;
            }
            if rolls[1] < chaos.config.repeat_rate {
                verdict.copies += 1;
            }
            if rolls[2] < chaos.config.corrupt_rate && len > 0 {
                let byte_index = chaos.rng.gen_range(0..len);
                let bit = chaos.rng.gen_range(0..8u8);
                verdict.flips.push((byte_index, bit));
            }
            if rolls[3] < chaos.config.reorder_rate {
                verdict.reorder = true;
            }
        }

        verdict
    }
}

impl ByteChannel for FaultyBus {
    fn enqueue(&mut self, name: &str, data: &[u8]) {
        let lane = self.lanes.entry(name.to_string()).or_default();
        lane.iteration += 1;
        lane.stats.sent += 1;

        let verdict = lane.judge(data.len());
        if verdict.drop {
            lane.stats.dropped += 1;
            debug!(channel = name, iteration = lane.iteration, "dropping entry");
            return;
        }

        let mut buf = data.to_vec();
        let mut corrupted = false;
        for (byte_index, bit) in verdict.flips {
            if let Some(byte) = buf.get_mut(byte_index) {
                *byte ^= 1 << bit;
                corrupted = true;
                debug!(channel = name, iteration = lane.iteration, byte_index, bit, "flipping bit");
            }
        }
        if corrupted {
            lane.stats.corrupted += 1;
        }

        let entry = Bytes::from(buf);
        let count = 1 + verdict.copies;
        lane.stats.duplicated += verdict.copies;
        if verdict.copies > 0 {
            debug!(channel = name, iteration = lane.iteration, copies = verdict.copies, "repeating entry");
        }

        if verdict.reorder && lane.held.is_none() {
            debug!(channel = name, iteration = lane.iteration, "holding entry back");
            lane.stats.reordered += 1;
            lane.held = Some((entry, count));
            return;
        }

        for _ in 0..count {
            self.inner.push(name, entry.clone());
        }
        if let Some((held, held_count)) = lane.held.take() {
            for _ in 0..held_count {
                self.inner.push(name, held.clone());
            }
        }
    }

    fn dequeue(&mut self, name: &str) -> Option<Bytes> {
        let entry = self.inner.dequeue(name)?;
        if let Some(lane) = self.lanes.get_mut(name) {
            lane.stats.delivered += 1;
        }
        Some(entry)
    }

    fn pending(&self, name: &str) -> usize {
        self.inner.pending(name)
    }
}
