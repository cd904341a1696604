use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::{prelude::*, quantity::rate::KilowattHourRate};

/// Effective-dated schedule: a queried date resolves to the value of the most
/// recent entry at or before it.
pub struct Schedule<V>(Vec<(NaiveDate, V)>);

impl<V: Copy> Schedule<V> {
    pub fn try_new(entries: BTreeMap<NaiveDate, V>) -> Result<Self> {
        ensure!(!entries.is_empty(), "an effective-dated schedule needs at least one entry");
        Ok(Self(entries.into_iter().collect()))
    }

    /// Value in effect on the given date.
    ///
    /// A date preceding every entry resolves to the *last* entry. Surprising,
    /// but existing reports depend on it — keep as is.
    pub fn resolve(&self, date: NaiveDate) -> V {
        let n_earlier = self.0.partition_point(|(effective, _)| *effective <= date);
        // `try_new` guarantees at least one entry.
        self.0[n_earlier.checked_sub(1).unwrap_or(self.0.len() - 1)].1
    }
}

/// Tariff values in effect on a single calendar date.
#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct Tariff {
    pub tax_delivery: KilowattHourRate,
    pub tax_redelivery: KilowattHourRate,
    pub markup_delivery: KilowattHourRate,
    pub markup_redelivery: KilowattHourRate,

    /// Value-added tax, in percent.
    pub vat: f64,
}

impl Tariff {
    /// Multiplier that applies the VAT on top of a net amount.
    #[must_use]
    pub fn vat_multiplier(&self) -> f64 {
        1.0 + self.vat / 100.0
    }
}

/// The five independent schedules a date is priced against.
pub struct TariffBook {
    pub tax_delivery: Schedule<KilowattHourRate>,
    pub tax_redelivery: Schedule<KilowattHourRate>,
    pub markup_delivery: Schedule<KilowattHourRate>,
    pub markup_redelivery: Schedule<KilowattHourRate>,
    pub vat: Schedule<f64>,
}

impl TariffBook {
    pub fn resolve(&self, date: NaiveDate) -> Tariff {
        Tariff {
            tax_delivery: self.tax_delivery.resolve(date),
            tax_redelivery: self.tax_redelivery.resolve(date),
            markup_delivery: self.markup_delivery.resolve(date),
            markup_redelivery: self.markup_redelivery.resolve(date),
            vat: self.vat.resolve(date),
        }
    }
}

/// Per-pass resolver: caches the lookup per distinct calendar date, since
/// tariffs do not change intraday and a pass iterates hourly rows.
pub struct TariffResolver<'a> {
    book: &'a TariffBook,
    cache: HashMap<NaiveDate, Tariff>,
}

impl<'a> TariffResolver<'a> {
    pub fn new(book: &'a TariffBook) -> Self {
        Self { book, cache: HashMap::new() }
    }

    pub fn resolve(&mut self, date: NaiveDate) -> Tariff {
        let Self { book, cache } = self;
        *cache.entry(date).or_insert_with(|| book.resolve(date))
    }
}
