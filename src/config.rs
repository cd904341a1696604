use std::{collections::BTreeMap, fs, path::Path};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    core::tariff::{Schedule, TariffBook},
    prelude::*,
    quantity::rate::KilowattHourRate,
};

/// Static configuration, read once at startup and immutable for the process
/// lifetime.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub store: Store,
    pub contract: Contract,
    pub sensors: Sensors,
    pub tariffs: Tariffs,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    /// Base URL of the aggregate and reading store API.
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Contract {
    /// Last invoice date: the current contract year starts here.
    pub last_invoice: NaiveDate,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Sensors {
    /// Grid import sensors, summed per hour.
    pub consumption: Vec<String>,

    /// Grid export sensors, summed per hour.
    pub production: Vec<String>,
}

/// The five effective-dated tariff maps, keyed by «effective from» date.
#[derive(Debug, Deserialize)]
pub struct Tariffs {
    pub tax_delivery: BTreeMap<NaiveDate, f64>,
    pub tax_redelivery: BTreeMap<NaiveDate, f64>,
    pub markup_delivery: BTreeMap<NaiveDate, f64>,
    pub markup_redelivery: BTreeMap<NaiveDate, f64>,

    /// Percent.
    pub vat: BTreeMap<NaiveDate, f64>,
}

impl Config {
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let config: Self =
            toml::from_str(&contents).context("failed to parse the configuration")?;
        ensure!(
            !config.sensors.consumption.is_empty(),
            "at least one consumption sensor must be configured",
        );
        Ok(config)
    }

    /// Build the effective-dated schedules the recalculation prices against.
    pub fn tariff_book(&self) -> Result<TariffBook> {
        Ok(TariffBook {
            tax_delivery: rates(&self.tariffs.tax_delivery).context("delivery tax schedule")?,
            tax_redelivery: rates(&self.tariffs.tax_redelivery)
                .context("redelivery tax schedule")?,
            markup_delivery: rates(&self.tariffs.markup_delivery)
                .context("delivery markup schedule")?,
            markup_redelivery: rates(&self.tariffs.markup_redelivery)
                .context("redelivery markup schedule")?,
            vat: Schedule::try_new(self.tariffs.vat.clone()).context("VAT schedule")?,
        })
    }
}

fn rates(entries: &BTreeMap<NaiveDate, f64>) -> Result<Schedule<KilowattHourRate>> {
    Schedule::try_new(
        entries.iter().map(|(date, rate)| (*date, KilowattHourRate::from(*rate))).collect(),
    )
}
