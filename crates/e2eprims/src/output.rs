use std::collections::BTreeMap;
use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use e2eprims::airbag::RunReport;
use e2eprims::campaign::{CampaignReport, ModeSummary};
use e2eprims::protect::E2eResult;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    kind: &'static str,
    version: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

fn print_json<T: Serialize>(kind: &'static str, body: &T) {
    let out = Envelope {
        kind,
        version: env!("CARGO_PKG_VERSION"),
        body,
    };
    println!(
        "{}",
        serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_run_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json("airbag-run", report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METRIC", "VALUE"]);
            table.add_row(vec!["mode".to_string(), mode_label(report.protected).to_string()]);
            table.add_row(vec!["readings sent".to_string(), report.readings_sent.to_string()]);
            table.add_row(vec![
                "frames received".to_string(),
                report.frames_received.to_string(),
            ]);
            table.add_row(vec!["malformed".to_string(), report.malformed.to_string()]);
            for (result, count) in &report.results {
                table.add_row(vec![result.as_str().to_string(), count.to_string()]);
            }
            if let Some(faults) = &report.faults {
                table.add_row(vec!["dropped".to_string(), faults.dropped.to_string()]);
                table.add_row(vec!["duplicated".to_string(), faults.duplicated.to_string()]);
                table.add_row(vec!["corrupted".to_string(), faults.corrupted.to_string()]);
                table.add_row(vec!["reordered".to_string(), faults.reordered.to_string()]);
            }
            table.add_row(vec!["deployed".to_string(), deployment(report)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Airbag run ({}):", mode_label(report.protected));
            println!("  Readings sent:    {}", report.readings_sent);
            println!("  Frames received:  {}", report.frames_received);
            println!("  Malformed:        {}", report.malformed);
            if !report.results.is_empty() {
                println!("  Results:          {}", results_line(&report.results));
            }
            if let Some(f) = &report.faults {
                println!(
                    "  Channel:          dropped={} duplicated={} corrupted={} reordered={}",
                    f.dropped, f.duplicated, f.corrupted, f.reordered
                );
            }
            println!("  Deployed:         {}", deployment(report));
        }
    }
}

pub fn print_campaign_report(report: &CampaignReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json("campaign", report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "MODE",
                    "RUNS",
                    "DEPLOYED",
                    "FALSE",
                    "MISSED",
                    "MALFORMED",
                    "RESULTS",
                ]);
            for (label, mode) in [
                ("unprotected", &report.unprotected),
                ("protected", &report.protected),
            ] {
                table.add_row(mode_row(label, mode));
            }
            println!("{table}");
            print_violations(report);
        }
        OutputFormat::Pretty => {
            println!(
                "Campaign seed={} runs={} readings={}:",
                report.seed, report.runs, report.readings
            );
            for (label, mode) in [
                ("unprotected", &report.unprotected),
                ("protected", &report.protected),
            ] {
                println!(
                    "  {label:<12} deployed={} false={} missed={} malformed={} {}",
                    mode.deployments,
                    mode.false_deployments,
                    mode.missed_deployments,
                    mode.malformed,
                    results_line(&mode.results)
                );
            }
            print_violations(report);
        }
    }
}

fn print_violations(report: &CampaignReport) {
    if report.passed() {
        println!("All properties held.");
        return;
    }
    for v in &report.violations {
        println!(
            "VIOLATION run={} seed={} pattern={:?}: {}",
            v.run, v.seed, v.pattern, v.reason
        );
    }
}

fn mode_row(label: &str, mode: &ModeSummary) -> Vec<String> {
    vec![
        label.to_string(),
        mode.runs.to_string(),
        mode.deployments.to_string(),
        mode.false_deployments.to_string(),
        mode.missed_deployments.to_string(),
        mode.malformed.to_string(),
        results_line(&mode.results),
    ]
}

fn mode_label(protected: bool) -> &'static str {
    if protected {
        "protected"
    } else {
        "unprotected"
    }
}

fn deployment(report: &RunReport) -> String {
    match report.deployed_at {
        Some(at) => format!("yes (after {at} readings)"),
        None => "no".to_string(),
    }
}

fn results_line(results: &BTreeMap<E2eResult, u64>) -> String {
    if results.is_empty() {
        return "-".to_string();
    }
    results
        .iter()
        .map(|(result, count)| format!("{result}={count}"))
        .collect::<Vec<_>>()
        .join(" ")
}
