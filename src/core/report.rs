use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::Sensors,
    core::{
        bucket::BucketRow,
        gap::GapFiller,
        period::{Catalog, PeriodName},
        resolution::Resolution,
        tariff::TariffBook,
    },
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
    store::{AggregateStore, ReadingStore},
};

/// Label of the synthetic totals row.
pub const TOTAL_LABEL: &str = "Totaal";

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, derive_more::Display)]
pub enum View {
    /// Tabular output, with a totals row appended.
    #[display("table")]
    Table,

    /// Chart feed (JSON): the same rows without the totals row.
    #[display("chart")]
    Chart,
}

/// Final, user-facing report row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub consumed: KilowattHours,
    pub produced: KilowattHours,
    pub net_consumed: KilowattHours,
    pub cost: Cost,
    pub profit: Cost,
    pub net_cost: Cost,
    pub consumption_rate: KilowattHourRate,
    pub production_rate: KilowattHourRate,
}

impl ReportRow {
    fn derive(
        label: String,
        consumed: KilowattHours,
        produced: KilowattHours,
        cost: Cost,
        profit: Cost,
    ) -> Self {
        Self {
            label,
            consumed,
            produced,
            net_consumed: consumed - produced,
            cost,
            profit,
            net_cost: cost - profit,
            consumption_rate: blended_rate(cost, consumed),
            production_rate: blended_rate(profit, produced),
        }
    }

    fn rounded(mut self) -> Self {
        self.consumed = self.consumed.rounded();
        self.produced = self.produced.rounded();
        self.net_consumed = self.net_consumed.rounded();
        self.cost = self.cost.rounded();
        self.profit = self.profit.rounded();
        self.net_cost = self.net_cost.rounded();
        self.consumption_rate = self.consumption_rate.rounded();
        self.production_rate = self.production_rate.rounded();
        self
    }
}

/// Blended €/kWh: total currency over total energy.
///
/// On a zero denominator the rate collapses to the raw currency figure.
/// Intentional fallback, not an error.
fn blended_rate(amount: Cost, energy: KilowattHours) -> KilowattHourRate {
    if energy == KilowattHours::ZERO {
        KilowattHourRate::from(amount.0)
    } else {
        KilowattHourRate::from(amount.0 / energy.0)
    }
}

/// Group bucket rows by label, sum the numeric columns and derive the
/// user-facing ones.
///
/// The table view appends the totals row: every column summed over the rows,
/// except the blended rates, which are recomputed from the summed totals
/// rather than averaged from per-row rates. Rounding to three decimals is the
/// final step.
pub fn build_report(rows: &[BucketRow], view: View) -> Vec<ReportRow> {
    let mut groups: BTreeMap<&str, (KilowattHours, KilowattHours, Cost, Cost)> = BTreeMap::new();
    for row in rows {
        let group = groups.entry(&row.label).or_default();
        group.0 += row.consumed;
        group.1 += row.produced;
        group.2 += row.cost;
        group.3 += row.profit;
    }

    let mut report: Vec<ReportRow> = groups
        .into_iter()
        .map(|(label, (consumed, produced, cost, profit))| {
            ReportRow::derive(label.to_owned(), consumed, produced, cost, profit)
        })
        .collect();

    if view == View::Table {
        let totals = ReportRow::derive(
            TOTAL_LABEL.to_owned(),
            report.iter().map(|row| row.consumed).sum(),
            report.iter().map(|row| row.produced).sum(),
            report.iter().map(|row| row.cost).sum(),
            report.iter().map(|row| row.profit).sum(),
        );
        report.push(totals);
    }

    report.into_iter().map(ReportRow::rounded).collect()
}

/// Wires the period catalog, tariff schedules, sensor set and the two stores
/// into the reporting pipeline.
#[derive(bon::Builder)]
pub struct ReportEngine<A, R> {
    catalog: Catalog,
    tariffs: TariffBook,
    sensors: Sensors,
    aggregates: A,
    readings: R,
}

impl<A: AggregateStore, R: ReadingStore> ReportEngine<A, R> {
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build the report for the named period: fetch persisted aggregates,
    /// fill the gap from raw readings and aggregate to report rows.
    #[instrument(skip(self))]
    pub fn report(
        &self,
        name: PeriodName,
        resolution: Option<Resolution>,
        view: View,
    ) -> Vec<ReportRow> {
        let period = self.catalog.get(name);
        let resolution = resolution.unwrap_or(period.resolution);
        let filler = GapFiller {
            aggregates: &self.aggregates,
            readings: &self.readings,
            sensors: &self.sensors,
            tariffs: &self.tariffs,
        };
        build_report(&filler.fill(period.interval, resolution), view)
    }
}
