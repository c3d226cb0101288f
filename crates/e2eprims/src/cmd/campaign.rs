use e2eprims::campaign::{run_campaign, CampaignConfig};

use crate::cmd::CampaignArgs;
use crate::exit::{campaign_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_campaign_report, OutputFormat};

pub fn run(args: CampaignArgs, format: OutputFormat) -> CliResult<i32> {
    let defaults = CampaignConfig::default();
    let config = CampaignConfig {
        runs: args.runs,
        readings: args.readings,
        seed: args.chaos.seed.unwrap_or(defaults.seed),
        chaos: args.chaos.config(defaults.chaos),
        protection: args.protection.config()?,
    };

    let report = run_campaign(&config).map_err(|err| campaign_error("campaign failed", err))?;
    print_campaign_report(&report, format);

    if report.passed() {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}
