pub mod bucket;
pub mod gap;
pub mod interval;
pub mod period;
pub mod reading;
pub mod recalculate;
pub mod report;
pub mod resolution;
pub mod tariff;
