//! Seeded fault-injection campaigns over the airbag demo.
//!
//! Every run draws a seed from the campaign seed, then drives the same
//! reading pattern through the same impaired channel twice: once
//! unprotected, once protected. Results are aggregated per mode.

use std::collections::BTreeMap;

use e2eprims_channel::{ChannelError, ChaosConfig, FaultyBus};
use e2eprims_protect::{E2eConfig, E2eResult, ProtectError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::airbag::{AirbagApp, ReadingPattern, RunReport, CHANNEL, DATA_SIZE, MAX_SEQ_DIFF};

/// Patterns cycled through, one per run.
pub const PATTERNS: [ReadingPattern; 3] = [
    ReadingPattern::Trigger,
    ReadingPattern::Idle,
    ReadingPattern::Alternate,
];

#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("protection error: {0}")]
    Protect(#[from] ProtectError),
}

pub type Result<T> = std::result::Result<T, CampaignError>;

/// Drive one pattern through `bus`, then release and drain anything still in flight.
pub fn simulate(
    bus: FaultyBus,
    config: E2eConfig,
    pattern: ReadingPattern,
    readings: u64,
    protected: bool,
) -> std::result::Result<RunReport, ProtectError> {
    let mut app = AirbagApp::with_config(bus, config);
    app.run(pattern, readings, protected)?;
    app.bus_mut().flush(CHANNEL);
    app.drain(protected);

    let (bus, mut report) = app.into_parts();
    report.faults = Some(bus.stats(CHANNEL).into());
    Ok(report)
}

/// Campaign parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CampaignConfig {
    pub runs: u64,
    pub readings: u64,
    pub seed: u64,
    /// Impairment rates. The seed field is replaced for every run.
    pub chaos: ChaosConfig,
    pub protection: E2eConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            runs: 30,
            readings: 100,
            seed: 0xE2E,
            chaos: ChaosConfig {
                drop_rate: 0.02,
                repeat_rate: 0.2,
                corrupt_rate: 0.05,
                reorder_rate: 0.05,
                seed: 0,
            },
            protection: E2eConfig::new(MAX_SEQ_DIFF, DATA_SIZE),
        }
    }
}

/// Aggregate over all runs of one mode.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSummary {
    pub runs: u64,
    pub deployments: u64,
    /// Deployments a lossless channel would not have produced.
    pub false_deployments: u64,
    /// Missing deployments a lossless channel would have produced.
    pub missed_deployments: u64,
    pub malformed: u64,
    pub results: BTreeMap<E2eResult, u64>,
}

impl ModeSummary {
    fn record(&mut self, pattern: ReadingPattern, readings: u64, report: &RunReport) {
        let expected = pattern.should_deploy(readings);
        self.runs += 1;
        self.malformed += report.malformed;
        if report.deployed {
            self.deployments += 1;
            if !expected {
                self.false_deployments += 1;
            }
        } else if expected {
            self.missed_deployments += 1;
        }
        for (result, count) in &report.results {
            *self.results.entry(*result).or_default() += count;
        }
    }
}

/// A broken campaign property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub run: u64,
    pub seed: u64,
    pub pattern: ReadingPattern,
    pub reason: String,
}

/// Campaign outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    pub seed: u64,
    pub runs: u64,
    pub readings: u64,
    pub unprotected: ModeSummary,
    pub protected: ModeSummary,
    pub violations: Vec<Violation>,
}

impl CampaignReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Run a campaign.
///
/// Properties checked on every protected run:
/// - no frame is ever classified `Undefined`
/// - no frame is rejected as malformed
/// - an idle stream never deploys
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.chaos.validate()?;

    let mut seeds = ChaCha8Rng::seed_from_u64(config.seed);
    let mut report = CampaignReport {
        seed: config.seed,
        runs: config.runs,
        readings: config.readings,
        unprotected: ModeSummary::default(),
        protected: ModeSummary::default(),
        violations: Vec::new(),
    };

    for run in 0..config.runs {
        let seed: u64 = seeds.gen();
        let pattern = PATTERNS[(run % PATTERNS.len() as u64) as usize];
        let chaos = ChaosConfig {
            seed,
            ..config.chaos
        };

        for protected in [false, true] {
            let mut bus = FaultyBus::new();
            bus.set_chaos(CHANNEL, chaos)?;
            let outcome = simulate(bus, config.protection, pattern, config.readings, protected)?;
            debug!(run, seed, ?pattern, protected, deployed = outcome.deployed, "run finished");

            if protected {
                report.protected.record(pattern, config.readings, &outcome);
                for reason in check_properties(pattern, &outcome) {
                    warn!(run, seed, ?pattern, %reason, "campaign property violated");
                    report.violations.push(Violation {
                        run,
                        seed,
                        pattern,
                        reason,
                    });
                }
            } else {
                report.unprotected.record(pattern, config.readings, &outcome);
            }
        }
    }

    Ok(report)
}

fn check_properties(pattern: ReadingPattern, outcome: &RunReport) -> Vec<String> {
    let mut reasons = Vec::new();
    let undefined = outcome.count(E2eResult::Undefined);
    if undefined > 0 {
        reasons.push(format!("{undefined} frames classified UNDEFINED"));
    }
    if outcome.malformed > 0 {
        reasons.push(format!("{} malformed frames", outcome.malformed));
    }
    if pattern == ReadingPattern::Idle && outcome.deployed {
        reasons.push("idle stream deployed the airbag".to_string());
    }
    reasons
}
