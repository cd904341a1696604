use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::core::{interval::Interval, resolution::Resolution};

/// Named reporting window.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, derive_more::Display)]
pub enum PeriodName {
    #[display("today")]
    Today,

    #[display("yesterday")]
    Yesterday,

    #[display("this week")]
    ThisWeek,

    #[display("last week")]
    LastWeek,

    #[display("this month")]
    ThisMonth,

    #[display("last month")]
    LastMonth,

    #[display("this year")]
    ThisYear,

    #[display("contract year")]
    ContractYear,
}

/// Half-open reporting window with its default bucket resolution.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct Period {
    pub name: PeriodName,
    pub interval: Interval,
    pub resolution: Resolution,
}

/// All reporting windows, derived from «now» at construction time
/// and immutable afterwards.
#[must_use]
pub struct Catalog {
    pub today: Period,
    pub yesterday: Period,
    pub this_week: Period,
    pub last_week: Period,
    pub this_month: Period,
    pub last_month: Period,
    pub this_year: Period,
    pub contract_year: Period,
}

impl Catalog {
    pub fn new(now: NaiveDateTime, last_invoice: NaiveDate) -> Self {
        let today = now.date();
        let yesterday = today - Days::new(1);
        let tomorrow = today + Days::new(1);

        // The week window runs up to the day after tomorrow's midnight, so the
        // partial current week is included through the end of tomorrow. When
        // the anchor itself falls on Monday, the window steps a full week back
        // instead of collapsing to nothing. Historical fence-post choice that
        // existing reports depend on.
        let anchor = today + Days::new(2);
        let week_start = if anchor.weekday() == Weekday::Mon {
            anchor - Days::new(7)
        } else {
            anchor - Days::new(u64::from(anchor.weekday().num_days_from_monday()))
        };

        let month_start = first_of_month(today);
        let previous_month_start = first_of_previous_month(today);
        let next_month_start = first_of_next_month(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap();

        Self {
            today: Period {
                name: PeriodName::Today,
                interval: Interval::new(midnight(today), midnight(tomorrow)),
                resolution: Resolution::Hour,
            },
            yesterday: Period {
                name: PeriodName::Yesterday,
                interval: Interval::new(midnight(yesterday), midnight(today)),
                resolution: Resolution::Hour,
            },
            this_week: Period {
                name: PeriodName::ThisWeek,
                interval: Interval::new(midnight(week_start), midnight(anchor)),
                resolution: Resolution::Day,
            },
            last_week: Period {
                name: PeriodName::LastWeek,
                interval: Interval::new(
                    midnight(week_start - Days::new(7)),
                    midnight(week_start),
                ),
                resolution: Resolution::Day,
            },
            this_month: Period {
                name: PeriodName::ThisMonth,
                interval: Interval::new(midnight(month_start), midnight(next_month_start)),
                resolution: Resolution::Day,
            },
            last_month: Period {
                name: PeriodName::LastMonth,
                interval: Interval::new(midnight(previous_month_start), midnight(month_start)),
                resolution: Resolution::Day,
            },
            this_year: Period {
                name: PeriodName::ThisYear,
                interval: Interval::new(midnight(year_start), midnight(tomorrow)),
                resolution: Resolution::Month,
            },
            contract_year: Period {
                name: PeriodName::ContractYear,
                interval: Interval::new(midnight(last_invoice), midnight(tomorrow)),
                resolution: Resolution::Month,
            },
        }
    }

    pub const fn get(&self, name: PeriodName) -> &Period {
        match name {
            PeriodName::Today => &self.today,
            PeriodName::Yesterday => &self.yesterday,
            PeriodName::ThisWeek => &self.this_week,
            PeriodName::LastWeek => &self.last_week,
            PeriodName::ThisMonth => &self.this_month,
            PeriodName::LastMonth => &self.last_month,
            PeriodName::ThisYear => &self.this_year,
            PeriodName::ContractYear => &self.contract_year,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        [
            &self.today,
            &self.yesterday,
            &self.this_week,
            &self.last_week,
            &self.this_month,
            &self.last_month,
            &self.this_year,
            &self.contract_year,
        ]
        .into_iter()
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
    }
}

fn first_of_previous_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 1 {
        NaiveDate::from_ymd_opt(date.year() - 1, 12, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() - 1, 1).unwrap()
    }
}
