use chrono::NaiveDateTime;

use crate::{
    core::{bucket::BucketRow, interval::Interval, reading::Reading, resolution::Resolution},
    prelude::*,
};

/// Series code of the hourly market price feed.
pub const PRICE_SERIES: &str = "price";

/// Persisted bucket aggregates.
///
/// The store groups raw hourly rows server-side by calendar day or month when
/// asked for those resolutions; hourly rows come back as-is.
pub trait AggregateStore {
    /// Rows covering the interval, time-ascending.
    fn query(&self, interval: Interval, resolution: Resolution) -> Result<Vec<BucketRow>>;
}

/// Raw hourly sensor and price readings.
pub trait ReadingStore {
    fn query_readings(&self, series: &str, interval: Interval) -> Result<Vec<Reading>>;

    fn latest_timestamp(&self, series: &str) -> Result<Option<NaiveDateTime>>;
}
