use chrono::NaiveDateTime;
use serde::Deserialize;

/// One raw hourly row from a sensor or the price feed.
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Reading {
    /// `None` marks a malformed row. Such rows are skipped during the merge
    /// and never reach the financial derivation.
    pub timestamp: Option<NaiveDateTime>,

    pub value: f64,
}

impl Reading {
    #[cfg(test)]
    pub fn at(timestamp: &str, value: f64) -> Self {
        Self { timestamp: Some(timestamp.parse().unwrap()), value }
    }
}
