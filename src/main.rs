#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod config;
mod core;
mod prelude;
mod quantity;
mod scheduler;
mod store;
mod tables;

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use clap::{Parser, crate_version};

use crate::{
    api::Client,
    cli::{Args, Command},
    config::{Config, Sensors},
    core::{
        period::Catalog,
        report::{ReportEngine, View},
    },
    prelude::*,
    scheduler::Scheduler,
    store::{AggregateStore, PRICE_SERIES, ReadingStore},
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let config = Config::read_from(&args.config_path)?;
    let client = Client::new(&config.store.base_url);
    let engine = ReportEngine::builder()
        .catalog(Catalog::new(Local::now().naive_local(), config.contract.last_invoice))
        .tariffs(config.tariff_book()?)
        .sensors(config.sensors.clone())
        .aggregates(client.clone())
        .readings(client.clone())
        .build();

    match args.command {
        Command::Report(report_args) => {
            let rows =
                engine.report(report_args.period, report_args.resolution, report_args.view);
            match report_args.view {
                View::Table => println!("{}", tables::build_report_table(&rows)),
                View::Chart => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
        Command::Periods => {
            println!("{}", tables::build_periods_table(engine.catalog()));
        }
        Command::Freshness => {
            let rows = freshness(&client, &config.sensors)?;
            println!("{}", tables::build_freshness_table(&rows));
        }
        Command::Watch(watch_args) => {
            watch(&engine, &client, &config.sensors, watch_args.interval);
        }
    }

    info!("done!");
    Ok(())
}

/// Rebuild every report each tick and keep an eye on the series freshness.
fn watch<A: AggregateStore, R: ReadingStore>(
    engine: &ReportEngine<A, R>,
    client: &Client,
    sensors: &Sensors,
    interval: Duration,
) -> ! {
    Scheduler::new()
        .with_task("reports", move || {
            for period in engine.catalog().iter() {
                let rows = engine.report(period.name, None, View::Table);
                if let Some(totals) = rows.last() {
                    info!(
                        period = %period.name,
                        net_cost = %totals.net_cost,
                        "rebuilt",
                    );
                }
            }
            Ok(())
        })
        .with_task("freshness", move || {
            for (series, timestamp) in freshness(client, sensors)? {
                match timestamp {
                    Some(timestamp) => debug!(series = %series, %timestamp, "fresh"),
                    None => warn!(series = %series, "no readings at all"),
                }
            }
            Ok(())
        })
        .run(interval)
}

fn freshness(
    client: &Client,
    sensors: &Sensors,
) -> Result<Vec<(String, Option<NaiveDateTime>)>> {
    let mut rows = vec![(PRICE_SERIES.to_owned(), client.latest_timestamp(PRICE_SERIES)?)];
    for series in sensors.consumption.iter().chain(&sensors.production) {
        rows.push((series.clone(), client.latest_timestamp(series)?));
    }
    Ok(rows)
}
