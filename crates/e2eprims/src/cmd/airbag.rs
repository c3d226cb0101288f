use e2eprims::airbag::CHANNEL;
use e2eprims::campaign::simulate;
use e2eprims::channel::{ChaosConfig, FaultyBus};
use tracing::info;

use crate::cmd::AirbagArgs;
use crate::exit::{channel_error, protect_error, CliResult, SUCCESS};
use crate::output::{print_run_report, OutputFormat};

pub fn run(args: AirbagArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.protection.config()?;
    let protected = !args.unprotected;

    let mut bus = FaultyBus::new();
    if let Some(plan) = args.faults.plan() {
        bus.add_fault(CHANNEL, plan)
            .map_err(|err| channel_error("invalid fault plan", err))?;
    }
    if args.chaos.is_requested() {
        let chaos = args.chaos.config(ChaosConfig::quiet(0));
        bus.set_chaos(CHANNEL, chaos)
            .map_err(|err| channel_error("invalid chaos config", err))?;
    }

    info!(pattern = ?args.pattern, readings = args.readings, protected, "starting airbag run");
    let report = simulate(bus, config, args.pattern, args.readings, protected)
        .map_err(|err| protect_error("airbag run failed", err))?;

    print_run_report(&report, format);
    Ok(SUCCESS)
}
