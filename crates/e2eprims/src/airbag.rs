//! Demo application: a crash sensor feeding an airbag controller.
//!
//! The sensor publishes a two-byte reading every cycle. The controller
//! deploys the airbag after [`ACTIVATIONS_TO_DEPLOY`] consecutive readings
//! equal to [`TRIGGER_PATTERN`]. Without protection, a channel that repeats a
//! single trigger reading is enough to deploy; with protection, repeated,
//! stale and corrupted frames are ignored.

use std::collections::BTreeMap;

use bytes::BytesMut;
use e2eprims_channel::{ByteChannel, ChannelStats};
use e2eprims_protect::{Decoder, E2eConfig, E2eResult, Encoder, ProtectError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Queue name shared by sensor and controller.
pub const CHANNEL: &str = "airbag";
/// Reading size in bytes.
pub const DATA_SIZE: u8 = 2;
/// Counter gap still accepted as "some lost".
pub const MAX_SEQ_DIFF: u8 = 2;
/// Consecutive trigger readings needed to deploy.
pub const ACTIVATIONS_TO_DEPLOY: u32 = 3;
/// Reading that signals a crash.
pub const TRIGGER_PATTERN: [u8; 2] = [85, 170];
/// Reading that signals normal driving.
pub const IDLE_PATTERN: [u8; 2] = [0, 0];

/// Sequence of readings the sensor publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReadingPattern {
    /// Every reading is a trigger.
    Trigger,
    /// No reading is a trigger.
    Idle,
    /// Trigger and idle readings alternate, starting with a trigger.
    Alternate,
}

impl ReadingPattern {
    /// Reading number `index` (0-based).
    pub fn reading(self, index: u64) -> [u8; 2] {
        match self {
            ReadingPattern::Trigger => TRIGGER_PATTERN,
            ReadingPattern::Idle => IDLE_PATTERN,
            ReadingPattern::Alternate if index % 2 == 0 => TRIGGER_PATTERN,
            ReadingPattern::Alternate => IDLE_PATTERN,
        }
    }

    /// Whether a lossless channel carrying this pattern ever deploys.
    pub fn should_deploy(self, readings: u64) -> bool {
        self == ReadingPattern::Trigger && readings >= u64::from(ACTIVATIONS_TO_DEPLOY)
    }
}

/// What the channel did to the traffic during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultSummary {
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub duplicated: u64,
    pub corrupted: u64,
    pub reordered: u64,
}

impl From<ChannelStats> for FaultSummary {
    fn from(stats: ChannelStats) -> Self {
        Self {
            sent: stats.sent,
            delivered: stats.delivered,
            dropped: stats.dropped,
            duplicated: stats.duplicated,
            corrupted: stats.corrupted,
            reordered: stats.reordered,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub protected: bool,
    pub readings_sent: u64,
    pub frames_received: u64,
    /// Frames of the wrong size for the configured protection.
    pub malformed: u64,
    /// Classification tally; empty for unprotected runs.
    pub results: BTreeMap<E2eResult, u64>,
    pub deployed: bool,
    /// Number of readings sent when the airbag deployed.
    pub deployed_at: Option<u64>,
    pub faults: Option<FaultSummary>,
}

impl RunReport {
    /// How many frames were classified as `result`.
    pub fn count(&self, result: E2eResult) -> u64 {
        self.results.get(&result).copied().unwrap_or(0)
    }
}

/// Sensor and controller sharing one byte channel.
pub struct AirbagApp<B> {
    bus: B,
    config: E2eConfig,
    encoder: Encoder,
    decoder: Decoder,
    activations: u32,
    report: RunReport,
}

impl<B: ByteChannel> AirbagApp<B> {
    /// Create the app with the default two-byte configuration.
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, E2eConfig::new(MAX_SEQ_DIFF, DATA_SIZE))
    }

    /// Create the app with an explicit protection configuration.
    ///
    /// An invalid configuration is logged and leaves protection
    /// unconfigured; protected readings are then never sent.
    pub fn with_config(bus: B, config: E2eConfig) -> Self {
        let mut app = Self {
            bus,
            config,
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            activations: 0,
            report: RunReport::default(),
        };
        app.init();
        app
    }

    /// Reset the controller and (re)initialise protection.
    pub fn init(&mut self) -> E2eResult {
        self.activations = 0;
        self.report = RunReport::default();

        let sent = self.encoder.init(Some(&self.config));
        let received = self.decoder.init(Some(&self.config));
        if sent != E2eResult::Ok || received != E2eResult::Ok {
            warn!(result = %sent, config = ?self.config, "bad init result");
        }
        sent
    }

    /// Publish an unprotected reading.
    pub fn sensor(&mut self, reading: &[u8]) {
        self.report.readings_sent += 1;
        self.bus.enqueue(CHANNEL, reading);
    }

    /// Drain the channel without protection, acting on every frame.
    pub fn iteration(&mut self) {
        while let Some(frame) = self.bus.dequeue(CHANNEL) {
            self.report.frames_received += 1;
            self.observe(&frame);
        }
    }

    /// Publish a protected reading.
    pub fn sensor_e2e(&mut self, reading: &[u8]) -> Result<E2eResult, ProtectError> {
        self.report.readings_sent += 1;
        self.report.protected = true;

        let mut frame = BytesMut::with_capacity(self.encoder.result_frame_size());
        let result = self.encoder.protect_payload(reading, &mut frame)?;
        if result == E2eResult::Ok {
            self.bus.enqueue(CHANNEL, &frame);
        } else {
            warn!(result = %result, "bad protect result");
        }
        Ok(result)
    }

    /// Drain the channel, acting only on frames classified `Ok` or `OkSomeLost`.
    pub fn iteration_e2e(&mut self) {
        let data_size = usize::from(self.config.data_size);

        while let Some(frame) = self.bus.dequeue(CHANNEL) {
            self.report.frames_received += 1;

            let result = match self.decoder.check(&frame) {
                Ok(result) => result,
                Err(err) => {
                    self.report.malformed += 1;
                    warn!(error = %err, "discarding malformed frame");
                    continue;
                }
            };
            *self.report.results.entry(result).or_default() += 1;

            if result.is_accepted() {
                self.observe(&frame[..data_size]);
            }
            if result != E2eResult::Ok {
                debug!(result = %result, len = frame.len(), data = ?frame.as_ref(), "bad check result");
            }
        }
    }

    /// Publish `readings` readings of `pattern`, draining the channel after each.
    pub fn run(
        &mut self,
        pattern: ReadingPattern,
        readings: u64,
        protected: bool,
    ) -> Result<&RunReport, ProtectError> {
        self.report.protected = protected;
        for index in 0..readings {
            let reading = pattern.reading(index);
            if protected {
                let payload = self.fit(&reading);
                self.sensor_e2e(&payload)?;
                self.iteration_e2e();
            } else {
                self.sensor(&reading);
                self.iteration();
            }
        }
        Ok(&self.report)
    }

    /// Drain whatever is still queued, in the given mode.
    pub fn drain(&mut self, protected: bool) {
        if protected {
            self.iteration_e2e();
        } else {
            self.iteration();
        }
    }

    /// Zero-pad or truncate a reading to the configured payload size.
    fn fit(&self, reading: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; usize::from(self.config.data_size)];
        let len = payload.len().min(reading.len());
        payload[..len].copy_from_slice(&reading[..len]);
        payload
    }

    fn observe(&mut self, payload: &[u8]) {
        if payload.starts_with(&TRIGGER_PATTERN) {
            self.activations += 1;
        } else {
            self.activations = 0;
        }

        if self.activations >= ACTIVATIONS_TO_DEPLOY && !self.report.deployed {
            self.report.deployed = true;
            self.report.deployed_at = Some(self.report.readings_sent);
            info!(readings = self.report.readings_sent, "airbag deployed");
        }
    }

    pub fn is_deployed(&self) -> bool {
        self.report.deployed
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Take the report and give back the channel.
    pub fn into_parts(self) -> (B, RunReport) {
        (self.bus, self.report)
    }
}

#[cfg(test)]
mod tests {
    use e2eprims_channel::{Fault, FaultPlan, FaultyBus, QueueBus, Trigger};

    use super::*;

    #[test]
    fn unprotected_trigger_deploys_on_third_reading() {
        let mut app = AirbagApp::new(QueueBus::new());
        let report = app.run(ReadingPattern::Trigger, 5, false).unwrap();

        assert!(report.deployed);
        assert_eq!(report.deployed_at, Some(3));
        assert!(report.results.is_empty());
    }

    #[test]
    fn protected_trigger_ignores_initial_frame() {
        let mut app = AirbagApp::new(QueueBus::new());
        let report = app.run(ReadingPattern::Trigger, 5, true).unwrap();

        assert!(report.deployed);
        assert_eq!(report.deployed_at, Some(4));
        assert_eq!(report.count(E2eResult::Initial), 1);
        assert_eq!(report.count(E2eResult::Ok), 4);
    }

    #[test]
    fn idle_reading_resets_activations() {
        let mut app = AirbagApp::new(QueueBus::new());
        app.sensor(&TRIGGER_PATTERN);
        app.sensor(&TRIGGER_PATTERN);
        app.iteration();
        assert_eq!(app.activations(), 2);

        app.sensor(&IDLE_PATTERN);
        app.sensor(&TRIGGER_PATTERN);
        app.iteration();
        assert_eq!(app.activations(), 1);
        assert!(!app.is_deployed());
    }

    #[test]
    fn repeated_trigger_fools_unprotected_controller() {
        let mut bus = FaultyBus::new();
        bus.add_fault(
            CHANNEL,
            FaultPlan::new(Fault::Repeat { copies: 2 }).with_trigger(Trigger::OnceAfter(0)),
        )
        .unwrap();

        let mut app = AirbagApp::new(bus);
        let report = app.run(ReadingPattern::Alternate, 6, false).unwrap();

        assert!(report.deployed);
        assert_eq!(report.deployed_at, Some(1));
    }

    #[test]
    fn repeated_trigger_is_ignored_when_protected() {
        let mut bus = FaultyBus::new();
        bus.add_fault(
            CHANNEL,
            FaultPlan::new(Fault::Repeat { copies: 2 }).with_trigger(Trigger::Every(3)),
        )
        .unwrap();

        let mut app = AirbagApp::new(bus);
        let report = app.run(ReadingPattern::Alternate, 12, true).unwrap();

        assert!(!report.deployed);
        assert_eq!(report.count(E2eResult::Repetition), 8);
    }

    #[test]
    fn corrupted_frames_are_counted_not_acted_on() {
        let mut bus = FaultyBus::new();
        bus.add_fault(
            CHANNEL,
            FaultPlan::new(Fault::BitFlip {
                byte_index: 0,
                bit: 0,
            })
            .with_trigger(Trigger::Every(2)),
        )
        .unwrap();

        let mut app = AirbagApp::new(bus);
        let report = app.run(ReadingPattern::Trigger, 8, true).unwrap();

        assert_eq!(report.count(E2eResult::WrongCrc), 4);
        assert_eq!(report.count(E2eResult::Undefined), 0);
        // Corrupted triggers neither count nor reset; readings 3, 5 and 7 do.
        assert_eq!(report.deployed_at, Some(7));
    }

    #[test]
    fn invalid_config_sends_nothing() {
        let mut app = AirbagApp::with_config(QueueBus::new(), E2eConfig::new(0, 2));
        assert_eq!(app.init(), E2eResult::NoConfiguration);

        assert_eq!(
            app.sensor_e2e(&TRIGGER_PATTERN).unwrap(),
            E2eResult::NoConfiguration
        );
        assert!(app.bus().is_empty(CHANNEL));
    }

    #[test]
    fn wrong_sized_frames_are_counted_as_malformed() {
        let mut app = AirbagApp::new(QueueBus::new());
        app.bus_mut().enqueue(CHANNEL, &[85, 170]);
        app.iteration_e2e();

        assert_eq!(app.report().malformed, 1);
        assert_eq!(app.report().frames_received, 1);
    }

    #[test]
    fn init_resets_controller() {
        let mut app = AirbagApp::new(QueueBus::new());
        app.run(ReadingPattern::Trigger, 4, true).unwrap();
        assert!(app.is_deployed());

        assert_eq!(app.init(), E2eResult::Ok);
        assert!(!app.is_deployed());
        assert!(app.decoder().is_awaiting_first_frame());
    }

    #[test]
    fn report_serializes_result_labels() {
        let mut app = AirbagApp::new(QueueBus::new());
        app.run(ReadingPattern::Idle, 2, true).unwrap();

        let json = serde_json::to_value(app.report()).unwrap();
        assert_eq!(json["results"]["INITIAL"], 1);
        assert_eq!(json["results"]["OK"], 1);
        assert_eq!(json["deployed"], false);
    }

    #[test]
    fn larger_payloads_are_zero_padded() {
        let mut app = AirbagApp::with_config(QueueBus::new(), E2eConfig::new(2, 4));
        let report = app.run(ReadingPattern::Trigger, 4, true).unwrap();

        assert!(report.deployed);
        assert_eq!(report.malformed, 0);
    }

    #[test]
    fn should_deploy_only_for_long_enough_trigger_runs() {
        assert!(ReadingPattern::Trigger.should_deploy(3));
        assert!(!ReadingPattern::Trigger.should_deploy(2));
        assert!(!ReadingPattern::Alternate.should_deploy(100));
    }
}
