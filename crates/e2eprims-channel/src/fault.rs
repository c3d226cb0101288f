//! Fault descriptions and activation rules.
//!
//! A [`FaultPlan`] bundles one or more [`Fault`]s with a [`Trigger`] and a
//! duration. Iterations are counted per queue name: the first entry enqueued
//! on a name is iteration 1.

use crate::error::{ChannelError, Result};

/// What happens to an entry while a plan is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The entry never reaches the queue.
    Drop,
    /// The entry is queued `1 + copies` times.
    Repeat { copies: u8 },
    /// One bit of the entry is inverted. Entries shorter than `byte_index`
    /// pass through untouched.
    BitFlip { byte_index: usize, bit: u8 },
    /// The entry is held back and queued after the next surviving entry.
    Reorder,
}

impl Fault {
    fn validate(&self) -> Result<()> {
        match self {
            Fault::BitFlip { bit, .. } if *bit > 7 => Err(ChannelError::InvalidBit(*bit)),
            _ => Ok(()),
        }
    }
}

/// When a plan becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Active on every iteration.
    #[default]
    Always,
    /// Active once, on the `duration` iterations following iteration `n`.
    OnceAfter(u64),
    /// Active at every multiple of `n`, for `duration` iterations each time.
    Every(u64),
}

/// A set of faults sharing one activation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultPlan {
    faults: Vec<Fault>,
    trigger: Trigger,
    duration: u64,
}

impl FaultPlan {
    /// A plan applying `fault` on every iteration.
    pub fn new(fault: Fault) -> Self {
        Self {
            faults: vec![fault],
            trigger: Trigger::Always,
            duration: 1,
        }
    }

    /// A plan with no faults yet. Must gain at least one before use.
    pub fn empty() -> Self {
        Self {
            faults: Vec::new(),
            trigger: Trigger::Always,
            duration: 1,
        }
    }

    /// Add another fault to apply alongside the existing ones.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Set the activation rule.
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set how many consecutive iterations each activation lasts.
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Check the plan before it is installed on a bus.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.faults.is_empty() {
            return Err(ChannelError::EmptyPlan(name.to_string()));
        }
        if self.duration == 0 {
            return Err(ChannelError::ZeroDuration);
        }
        if self.trigger == Trigger::Every(0) {
            return Err(ChannelError::ZeroPeriod);
        }
        self.faults.iter().try_for_each(Fault::validate)
    }

    /// Whether the plan applies to the entry enqueued on `iteration`.
    pub fn is_active(&self, iteration: u64) -> bool {
        match self.trigger {
            Trigger::Always => true,
            Trigger::OnceAfter(n) => iteration > n && iteration <= n.saturating_add(self.duration),
            Trigger::Every(0) => false,
            Trigger::Every(period) => {
                let last_fire = (iteration / period) * period;
                last_fire > 0 && iteration - last_fire < self.duration
            }
        }
    }
}

/// Independent per-entry fault probabilities driven by a seeded RNG.
///
/// Identical seeds and inputs produce identical fault sequences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosConfig {
    /// Probability an entry is dropped.
    pub drop_rate: f64,
    /// Probability an entry is queued twice.
    pub repeat_rate: f64,
    /// Probability one random bit of an entry is flipped.
    pub corrupt_rate: f64,
    /// Probability an entry is swapped with the next one.
    pub reorder_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl ChaosConfig {
    /// No impairments at all.
    pub fn quiet(seed: u64) -> Self {
        Self {
            drop_rate: 0.0,
            repeat_rate: 0.0,
            corrupt_rate: 0.0,
            reorder_rate: 0.0,
            seed,
        }
    }

    /// A noisy channel: 5% of each impairment.
    pub fn noisy(seed: u64) -> Self {
        Self {
            drop_rate: 0.05,
            repeat_rate: 0.05,
            corrupt_rate: 0.05,
            reorder_rate: 0.05,
            seed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("drop", self.drop_rate),
            ("repeat", self.repeat_rate),
            ("corrupt", self.corrupt_rate),
            ("reorder", self.reorder_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ChannelError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}
