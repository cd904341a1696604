use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Bucket granularity of a report.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Deserialize,
    Serialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[display("hour")]
    Hour,

    #[display("day")]
    Day,

    #[display("month")]
    Month,
}

impl Resolution {
    /// Bucket label for the given hourly timestamp.
    ///
    /// Labels are ISO prefixes, so lexicographic order is chronological order.
    #[must_use]
    pub fn label(self, timestamp: NaiveDateTime) -> String {
        match self {
            Self::Hour => timestamp.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => timestamp.format("%Y-%m-%d").to_string(),
            Self::Month => timestamp.format("%Y-%m").to_string(),
        }
    }
}
