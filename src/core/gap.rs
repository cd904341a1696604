use chrono::TimeDelta;

use crate::{
    config::Sensors,
    core::{
        bucket::{BucketRow, HourlyTable},
        interval::Interval,
        reading::Reading,
        recalculate::Recalculator,
        resolution::Resolution,
        tariff::TariffBook,
    },
    prelude::*,
    store::{AggregateStore, PRICE_SERIES, ReadingStore},
};

/// Completes persisted aggregates with rows recalculated from raw readings.
pub struct GapFiller<'a> {
    pub aggregates: &'a dyn AggregateStore,
    pub readings: &'a dyn ReadingStore,
    pub sensors: &'a Sensors,
    pub tariffs: &'a TariffBook,
}

impl GapFiller<'_> {
    /// Fetch persisted rows for the interval and recalculate the uncovered
    /// tail from raw sensor and price readings.
    #[instrument(skip_all)]
    pub fn fill(&self, interval: Interval, resolution: Resolution) -> Vec<BucketRow> {
        let mut rows = self.aggregates.query(interval, resolution).unwrap_or_else(|error| {
            warn!(
                error = format!("{error:#}"),
                "aggregate query failed, recalculating the whole range",
            );
            Vec::new()
        });

        let gap_start =
            rows.last().map_or(interval.start, |row| row.last_hour + TimeDelta::hours(1));
        if gap_start >= interval.end {
            return rows;
        }
        let gap = Interval::new(gap_start, interval.end);
        debug!(?gap, "recalculating from raw readings");

        let mut table = HourlyTable::default();
        table.set_prices(&self.fetch(PRICE_SERIES, gap));
        for sensor in &self.sensors.consumption {
            table.add_consumed(&self.fetch(sensor, gap));
        }
        for sensor in &self.sensors.production {
            table.add_produced(&self.fetch(sensor, gap));
        }
        if table.is_empty() {
            return rows;
        }

        rows.extend(Recalculator::new(self.tariffs).recalculate(&table, resolution));
        rows
    }

    /// A failed fetch degrades to an empty series: reporting is best-effort.
    fn fetch(&self, series: &str, interval: Interval) -> Vec<Reading> {
        self.readings.query_readings(series, interval).unwrap_or_else(|error| {
            warn!(
                series,
                error = format!("{error:#}"),
                "reading query failed, treating the range as empty",
            );
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        core::tariff::testing as tariffs,
        quantity::{cost::Cost, energy::KilowattHours},
        store::testing::{
            FailingAggregates, FailingReadings, InMemoryAggregates, InMemoryReadings,
        },
    };

    fn sensors() -> Sensors {
        Sensors { consumption: vec!["grid".to_owned()], production: vec!["solar".to_owned()] }
    }

    fn persisted_hour(timestamp: &str) -> BucketRow {
        BucketRow {
            label: format!("{timestamp} 13:00"),
            start: format!("{timestamp}T13:00:00").parse().unwrap(),
            last_hour: format!("{timestamp}T13:00:00").parse().unwrap(),
            consumed: KilowattHours::from(1.0),
            produced: KilowattHours::ZERO,
            cost: Cost::from(0.25),
            profit: Cost::ZERO,
        }
    }

    #[test]
    fn test_full_coverage_performs_zero_raw_fetches() {
        let aggregates = InMemoryAggregates(vec![persisted_hour("2023-03-15")]);
        let readings = InMemoryReadings::default();
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &aggregates,
            readings: &readings,
            sensors: &sensors(),
            tariffs: &book,
        };

        // The persisted row covers up to 14:00, exactly the requested end.
        let interval = Interval::new(
            "2023-03-15T13:00:00".parse().unwrap(),
            "2023-03-15T14:00:00".parse().unwrap(),
        );
        let rows = filler.fill(interval, Resolution::Hour);

        assert_eq!(rows.len(), 1);
        assert_eq!(readings.n_queries.get(), 0);
    }

    #[test]
    fn test_gap_is_recalculated_and_appended() {
        let aggregates = InMemoryAggregates(vec![persisted_hour("2023-03-15")]);
        let readings = InMemoryReadings::with_series(&[
            (PRICE_SERIES, vec![Reading::at("2023-03-15T14:00:00", 0.20)]),
            ("grid", vec![Reading::at("2023-03-15T14:00:00", 2.0)]),
            ("solar", vec![Reading::at("2023-03-15T14:00:00", 0.5)]),
        ]);
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &aggregates,
            readings: &readings,
            sensors: &sensors(),
            tariffs: &book,
        };

        let interval = Interval::new(
            "2023-03-15T13:00:00".parse().unwrap(),
            "2023-03-15T15:00:00".parse().unwrap(),
        );
        let rows = filler.fill(interval, Resolution::Hour);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "2023-03-15 14:00");
        assert_eq!(rows[1].consumed, KilowattHours::from(2.0));
        assert_eq!(readings.n_queries.get(), 3);
    }

    #[test]
    fn test_failed_aggregate_read_recalculates_the_whole_range() {
        let readings = InMemoryReadings::with_series(&[
            (PRICE_SERIES, vec![Reading::at("2023-03-15T13:00:00", 0.20)]),
            ("grid", vec![Reading::at("2023-03-15T13:00:00", 1.0)]),
        ]);
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &FailingAggregates,
            readings: &readings,
            sensors: &sensors(),
            tariffs: &book,
        };

        let interval = Interval::new(
            "2023-03-15T13:00:00".parse().unwrap(),
            "2023-03-15T14:00:00".parse().unwrap(),
        );
        let rows = filler.fill(interval, Resolution::Hour);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].consumed, KilowattHours::from(1.0));
    }

    #[test]
    fn test_failed_reading_fetches_keep_the_persisted_rows() {
        let aggregates = InMemoryAggregates(vec![persisted_hour("2023-03-15")]);
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &aggregates,
            readings: &FailingReadings,
            sensors: &sensors(),
            tariffs: &book,
        };

        // There is an uncovered hour at 14:00, but every fetch fails.
        let interval = Interval::new(
            "2023-03-15T13:00:00".parse().unwrap(),
            "2023-03-15T15:00:00".parse().unwrap(),
        );
        let rows = filler.fill(interval, Resolution::Hour);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "2023-03-15 13:00");
    }

    #[test]
    fn test_one_failing_series_does_not_drop_the_others() {
        let aggregates = InMemoryAggregates(Vec::new());
        let readings = InMemoryReadings::with_series(&[(
            "grid",
            vec![Reading::at("2023-03-15T13:00:00", 2.0)],
        )])
        .failing_series(PRICE_SERIES);
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &aggregates,
            readings: &readings,
            sensors: &sensors(),
            tariffs: &book,
        };

        let interval = Interval::new(
            "2023-03-15T13:00:00".parse().unwrap(),
            "2023-03-15T14:00:00".parse().unwrap(),
        );
        let rows = filler.fill(interval, Resolution::Hour);

        // The hour is still priced, with the market price degraded to zero:
        // 2.0 × (0.00 + 0.05 + 0.02) × 1.21.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].consumed, KilowattHours::from(2.0));
        assert_abs_diff_eq!(rows[0].cost.0.0, 0.1694, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_everything_is_not_an_error() {
        let aggregates = InMemoryAggregates(Vec::new());
        let readings = InMemoryReadings::default();
        let book = tariffs::book();
        let filler = GapFiller {
            aggregates: &aggregates,
            readings: &readings,
            sensors: &sensors(),
            tariffs: &book,
        };

        let interval = Interval::new(
            "2023-03-15T00:00:00".parse().unwrap(),
            "2023-03-16T00:00:00".parse().unwrap(),
        );
        assert!(filler.fill(interval, Resolution::Hour).is_empty());
    }
}
