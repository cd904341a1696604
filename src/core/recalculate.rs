use std::collections::BTreeMap;

use crate::core::{
    bucket::{BucketRow, HourlyTable},
    resolution::Resolution,
    tariff::{TariffBook, TariffResolver},
};

/// Derives hourly cost and profit from merged readings and groups them to the
/// requested resolution.
pub struct Recalculator<'a> {
    tariffs: TariffResolver<'a>,
}

impl<'a> Recalculator<'a> {
    pub fn new(book: &'a TariffBook) -> Self {
        Self { tariffs: TariffResolver::new(book) }
    }

    /// Currency is never rounded here — only at presentation, after any
    /// grouping, so rounding error does not compound across buckets.
    pub fn recalculate(mut self, table: &HourlyTable, resolution: Resolution) -> Vec<BucketRow> {
        let mut buckets: BTreeMap<String, BucketRow> = BTreeMap::new();
        for (&timestamp, row) in table.iter() {
            let tariff = self.tariffs.resolve(timestamp.date());
            let vat = tariff.vat_multiplier();
            let cost =
                row.consumed * (row.price + tariff.tax_delivery + tariff.markup_delivery) * vat;
            let profit =
                row.produced * (row.price + tariff.tax_redelivery + tariff.markup_redelivery) * vat;

            let label = resolution.label(timestamp);
            if let Some(bucket) = buckets.get_mut(&label) {
                bucket.consumed += row.consumed;
                bucket.produced += row.produced;
                bucket.cost += cost;
                bucket.profit += profit;
                bucket.start = bucket.start.min(timestamp);
                bucket.last_hour = bucket.last_hour.max(timestamp);
            } else {
                buckets.insert(
                    label.clone(),
                    BucketRow {
                        label,
                        start: timestamp,
                        last_hour: timestamp,
                        consumed: row.consumed,
                        produced: row.produced,
                        cost,
                        profit,
                    },
                );
            }
        }
        buckets.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::{reading::Reading, tariff::testing};

    #[test]
    fn test_hourly_cost_and_profit() {
        let mut table = HourlyTable::default();
        table.set_prices(&[Reading::at("2023-03-15T13:00:00", 0.20)]);
        table.add_consumed(&[Reading::at("2023-03-15T13:00:00", 2.0)]);
        table.add_produced(&[Reading::at("2023-03-15T13:00:00", 0.5)]);

        let book = testing::book();
        let rows = Recalculator::new(&book).recalculate(&table, Resolution::Hour);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "2023-03-15 13:00");
        // 2.0 × (0.20 + 0.05 + 0.02) × 1.21 and 0.5 × (0.20 + 0.01 + 0.01) × 1.21.
        assert_abs_diff_eq!(rows[0].cost.0.0, 0.6534, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].profit.0.0, 0.1331, epsilon = 1e-9);
    }

    #[test]
    fn test_daily_grouping_keeps_the_hour_window() {
        let mut table = HourlyTable::default();
        table.set_prices(&[
            Reading::at("2023-03-15T13:00:00", 0.20),
            Reading::at("2023-03-15T14:00:00", 0.10),
        ]);
        table.add_consumed(&[
            Reading::at("2023-03-15T13:00:00", 1.0),
            Reading::at("2023-03-15T14:00:00", 1.0),
        ]);

        let book = testing::book();
        let rows = Recalculator::new(&book).recalculate(&table, Resolution::Day);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "2023-03-15");
        assert_eq!(rows[0].start, "2023-03-15T13:00:00".parse().unwrap());
        assert_eq!(rows[0].last_hour, "2023-03-15T14:00:00".parse().unwrap());
        // (0.20 + 0.07) × 1.21 + (0.10 + 0.07) × 1.21.
        assert_abs_diff_eq!(rows[0].cost.0.0, 0.5324, epsilon = 1e-9);
    }

    #[test]
    fn test_monthly_grouping_splits_months() {
        let mut table = HourlyTable::default();
        table.add_consumed(&[
            Reading::at("2023-03-31T23:00:00", 1.0),
            Reading::at("2023-04-01T00:00:00", 1.0),
        ]);

        let book = testing::book();
        let rows = Recalculator::new(&book).recalculate(&table, Resolution::Month);

        let labels: Vec<_> = rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, ["2023-03", "2023-04"]);
    }
}
