use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    core::reading::Reading,
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Aggregated energy and money over one bucket (hour, day or month).
///
/// This is the unit of both persisted aggregates and recalculated rows.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BucketRow {
    pub label: String,

    /// Start of the first hour folded into the bucket.
    pub start: NaiveDateTime,

    /// Start of the last hour folded into the bucket, so `last_hour + 1h` is
    /// the first moment the bucket does not cover.
    pub last_hour: NaiveDateTime,

    pub consumed: KilowattHours,
    pub produced: KilowattHours,
    pub cost: Cost,
    pub profit: Cost,
}

/// Merged hourly readings from all sources, keyed by timestamp.
///
/// Every source merges with «insert or add»: the first source initializes an
/// hour, later sources accumulate into it. A missing reading simply leaves
/// that metric at zero for the hour.
#[derive(Default)]
#[must_use]
pub struct HourlyTable(BTreeMap<NaiveDateTime, HourlyRow>);

#[derive(Copy, Clone, Default)]
pub struct HourlyRow {
    pub consumed: KilowattHours,
    pub produced: KilowattHours,
    pub price: KilowattHourRate,
}

impl HourlyTable {
    pub fn set_prices(&mut self, readings: &[Reading]) {
        for (timestamp, value) in well_formed(readings) {
            self.0.entry(timestamp).or_default().price = KilowattHourRate::from(value);
        }
    }

    pub fn add_consumed(&mut self, readings: &[Reading]) {
        for (timestamp, value) in well_formed(readings) {
            self.0.entry(timestamp).or_default().consumed += KilowattHours::from(value);
        }
    }

    pub fn add_produced(&mut self, readings: &[Reading]) {
        for (timestamp, value) in well_formed(readings) {
            self.0.entry(timestamp).or_default().produced += KilowattHours::from(value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &HourlyRow)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn well_formed(readings: &[Reading]) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
    readings.iter().filter_map(|reading| {
        if let Some(timestamp) = reading.timestamp {
            Some((timestamp, reading.value))
        } else {
            debug!("skipping a reading without a timestamp");
            None
        }
    })
}
