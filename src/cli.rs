use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

use crate::core::{period::PeriodName, report::View, resolution::Resolution};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Path to the configuration file.
    #[clap(long = "config", env = "METERKAST_CONFIG", default_value = "meterkast.toml")]
    pub config_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render the financial report for one period.
    Report(ReportArgs),

    /// List the reporting periods.
    Periods,

    /// Show the latest available reading per series.
    Freshness,

    /// Rebuild every report periodically.
    Watch(WatchArgs),
}

#[derive(clap::Args)]
pub struct ReportArgs {
    /// Reporting period.
    #[clap(long, value_enum)]
    pub period: PeriodName,

    /// Override the period's default bucket resolution.
    #[clap(long, value_enum)]
    pub resolution: Option<Resolution>,

    /// Output view.
    #[clap(long, value_enum, default_value_t = View::Table)]
    pub view: View,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Tick interval.
    #[clap(long, value_parser = humantime::parse_duration, default_value = "60s")]
    pub interval: Duration,
}
