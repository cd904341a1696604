use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::{
    core::{bucket::BucketRow, interval::Interval, reading::Reading, resolution::Resolution},
    prelude::*,
    store::{AggregateStore, ReadingStore},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Blocking JSON client for the aggregate and reading store API.
#[derive(Clone)]
pub struct Client {
    agent: Agent,
    base_url: String,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { agent: Agent::new_with_defaults(), base_url: base_url.into() }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self.agent.get(&url);
        for (name, value) in query {
            request = request.query(*name, value);
        }
        request
            .call()
            .with_context(|| format!("failed to call `{url}`"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("failed to deserialize the `{url}` response"))
    }
}

impl AggregateStore for Client {
    #[instrument(skip(self))]
    fn query(&self, interval: Interval, resolution: Resolution) -> Result<Vec<BucketRow>> {
        self.get_json(
            "aggregates",
            &[
                ("start", interval.start.format(TIMESTAMP_FORMAT).to_string()),
                ("end", interval.end.format(TIMESTAMP_FORMAT).to_string()),
                ("resolution", resolution.to_string()),
            ],
        )
    }
}

impl ReadingStore for Client {
    #[instrument(skip(self))]
    fn query_readings(&self, series: &str, interval: Interval) -> Result<Vec<Reading>> {
        self.get_json(
            &format!("readings/{series}"),
            &[
                ("start", interval.start.format(TIMESTAMP_FORMAT).to_string()),
                ("end", interval.end.format(TIMESTAMP_FORMAT).to_string()),
            ],
        )
    }

    #[instrument(skip(self))]
    fn latest_timestamp(&self, series: &str) -> Result<Option<NaiveDateTime>> {
        self.get_json(&format!("readings/{series}/latest"), &[])
    }
}
