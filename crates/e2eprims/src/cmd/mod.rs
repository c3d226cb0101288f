use clap::{Args, Subcommand};
use e2eprims::airbag::{ReadingPattern, DATA_SIZE, MAX_SEQ_DIFF};
use e2eprims::channel::{ChaosConfig, Fault, FaultPlan, Trigger};
use e2eprims::protect::E2eConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod airbag;
pub mod campaign;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the airbag demo over an optionally faulty channel.
    Airbag(AirbagArgs),
    /// Compare protected and unprotected runs over many seeded faulty channels.
    Campaign(CampaignArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Airbag(args) => airbag::run(args, format),
        Command::Campaign(args) => campaign::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct AirbagArgs {
    /// Number of sensor readings to publish.
    #[arg(long, default_value = "10")]
    pub readings: u64,
    /// Reading sequence the sensor publishes.
    #[arg(long, value_enum, default_value = "trigger")]
    pub pattern: ReadingPattern,
    /// Send raw readings without sequence counter and CRC.
    #[arg(long)]
    pub unprotected: bool,
    #[command(flatten)]
    pub protection: ProtectionArgs,
    #[command(flatten)]
    pub faults: FaultArgs,
    #[command(flatten)]
    pub chaos: ChaosArgs,
}

#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// Number of runs per mode.
    #[arg(long, default_value = "30")]
    pub runs: u64,
    /// Readings per run.
    #[arg(long, default_value = "100")]
    pub readings: u64,
    #[command(flatten)]
    pub protection: ProtectionArgs,
    #[command(flatten)]
    pub chaos: ChaosArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug)]
pub struct ProtectionArgs {
    /// Payload bytes per frame.
    #[arg(long, env = "E2EPRIMS_DATA_SIZE", default_value_t = DATA_SIZE)]
    pub data_size: u8,
    /// Largest counter gap still accepted as "some lost".
    #[arg(long, env = "E2EPRIMS_MAX_SEQ_DIFF", default_value_t = MAX_SEQ_DIFF)]
    pub max_seq_diff: u8,
}

impl ProtectionArgs {
    pub fn config(&self) -> CliResult<E2eConfig> {
        let config = E2eConfig::new(self.max_seq_diff, self.data_size);
        if !config.is_valid() {
            return Err(CliError::new(
                USAGE,
                format!(
                    "invalid protection config: data size {} and max sequence diff {} must both be non-zero",
                    self.data_size, self.max_seq_diff
                ),
            ));
        }
        Ok(config)
    }
}

/// Deterministic faults, applied while the trigger is active.
#[derive(Args, Debug)]
pub struct FaultArgs {
    /// Drop frames.
    #[arg(long)]
    pub drop: bool,
    /// Queue N extra copies of each frame.
    #[arg(long, value_name = "N")]
    pub repeat: Option<u8>,
    /// Invert one bit of each frame.
    #[arg(long, value_name = "BYTE:BIT", value_parser = parse_bit_flip)]
    pub bit_flip: Option<(usize, u8)>,
    /// Deliver each frame after the next one.
    #[arg(long)]
    pub reorder: bool,
    /// Activate once, after N frames.
    #[arg(long, value_name = "N", conflicts_with = "every")]
    pub after: Option<u64>,
    /// Activate on every Nth frame.
    #[arg(long, value_name = "N")]
    pub every: Option<u64>,
    /// Frames affected per activation.
    #[arg(long, value_name = "N", default_value = "1")]
    pub duration: u64,
}

impl FaultArgs {
    /// The plan described by the flags, if any fault was requested.
    pub fn plan(&self) -> Option<FaultPlan> {
        let mut faults = Vec::new();
        if self.drop {
            faults.push(Fault::Drop);
        }
        if let Some(copies) = self.repeat {
            faults.push(Fault::Repeat { copies });
        }
        if let Some((byte_index, bit)) = self.bit_flip {
            faults.push(Fault::BitFlip { byte_index, bit });
        }
        if self.reorder {
            faults.push(Fault::Reorder);
        }
        if faults.is_empty() {
            return None;
        }

        let trigger = match (self.after, self.every) {
            (Some(n), _) => Trigger::OnceAfter(n),
            (None, Some(n)) => Trigger::Every(n),
            (None, None) => Trigger::Always,
        };
        let plan = faults
            .into_iter()
            .fold(FaultPlan::empty(), FaultPlan::with_fault)
            .with_trigger(trigger)
            .with_duration(self.duration);
        Some(plan)
    }
}

/// Seeded random impairments. Unset rates fall back to the command default.
#[derive(Args, Debug)]
pub struct ChaosArgs {
    /// RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Probability a frame is dropped.
    #[arg(long, value_name = "P")]
    pub loss_rate: Option<f64>,
    /// Probability a frame is queued twice.
    #[arg(long, value_name = "P")]
    pub repeat_rate: Option<f64>,
    /// Probability one random bit of a frame is flipped.
    #[arg(long, value_name = "P")]
    pub corrupt_rate: Option<f64>,
    /// Probability a frame is swapped with the next one.
    #[arg(long, value_name = "P")]
    pub reorder_rate: Option<f64>,
}

impl ChaosArgs {
    pub fn config(&self, defaults: ChaosConfig) -> ChaosConfig {
        ChaosConfig {
            drop_rate: self.loss_rate.unwrap_or(defaults.drop_rate),
            repeat_rate: self.repeat_rate.unwrap_or(defaults.repeat_rate),
            corrupt_rate: self.corrupt_rate.unwrap_or(defaults.corrupt_rate),
            reorder_rate: self.reorder_rate.unwrap_or(defaults.reorder_rate),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }

    /// Whether any rate was given on the command line.
    pub fn is_requested(&self) -> bool {
        self.loss_rate.is_some()
            || self.repeat_rate.is_some()
            || self.corrupt_rate.is_some()
            || self.reorder_rate.is_some()
    }
}

fn parse_bit_flip(input: &str) -> Result<(usize, u8), String> {
    let (byte, bit) = input
        .split_once(':')
        .ok_or_else(|| format!("expected BYTE:BIT, got {input}"))?;
    let byte: usize = byte
        .trim()
        .parse()
        .map_err(|_| format!("invalid byte index: {byte}"))?;
    let bit: u8 = bit
        .trim()
        .parse()
        .map_err(|_| format!("invalid bit index: {bit}"))?;
    if bit > 7 {
        return Err(format!("bit index {bit} out of range (expected 0-7)"));
    }
    Ok((byte, bit))
}
