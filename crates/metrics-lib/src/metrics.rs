//! Metric fetching from the monitoring service
//!
//! Every query is a 1-minute-resolution aggregation over a lookback window
//! ending `end_offset_secs` before now. Only the latest datapoint matters.
//! Failures and empty results are reported as [`MetricReading`] variants and
//! collapse to `0.0` through [`MetricReading::value_or_zero`].

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::client::MonitoringApi;
use crate::models::SummarizeMetricsDataDetails;

/// Namespace the compute agent publishes into
pub const COMPUTE_AGENT_NAMESPACE: &str = "oci_computeagent";

/// Aggregation resolution for every query
pub const RESOLUTION: &str = "1m";

/// Default lookback window in seconds
pub const DEFAULT_LOOKBACK_SECS: i64 = 300;

/// Time window a query covers, relative to the moment it is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    pub lookback_secs: i64,
    pub end_offset_secs: i64,
}

impl Default for MetricWindow {
    fn default() -> Self {
        Self {
            lookback_secs: DEFAULT_LOOKBACK_SECS,
            end_offset_secs: 0,
        }
    }
}

impl MetricWindow {
    pub fn with_lookback(lookback_secs: i64) -> Self {
        Self {
            lookback_secs,
            ..Self::default()
        }
    }

    /// Start and end of the window anchored at `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            now - Duration::seconds(self.lookback_secs),
            now - Duration::seconds(self.end_offset_secs),
        )
    }
}

/// A namespace and query expression, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub namespace: String,
    pub query: String,
}

impl MetricQuery {
    pub fn new(namespace: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            query: query.into(),
        }
    }

    /// Mean CPU utilization of one instance
    pub fn cpu_utilization(instance_id: &str) -> Self {
        Self::new(
            COMPUTE_AGENT_NAMESPACE,
            format!("CpuUtilization[1m]{{resourceId=\"{}\"}}.mean()", instance_id),
        )
    }

    /// Mean memory utilization of one instance
    pub fn memory_utilization(instance_id: &str) -> Self {
        Self::new(
            COMPUTE_AGENT_NAMESPACE,
            format!("MemoryUtilization[1m]{{resourceId=\"{}\"}}.mean()", instance_id),
        )
    }

    /// Request body for this query over `window`, anchored at `now`
    pub fn details(
        &self,
        window: MetricWindow,
        now: DateTime<Utc>,
    ) -> SummarizeMetricsDataDetails {
        let (start_time, end_time) = window.bounds(now);
        SummarizeMetricsDataDetails {
            namespace: self.namespace.clone(),
            query: self.query.clone(),
            start_time,
            end_time,
            resolution: RESOLUTION.to_string(),
        }
    }
}

/// Outcome of one metric query
#[derive(Debug, Clone, PartialEq)]
pub enum MetricReading {
    /// Latest aggregated datapoint
    Value(f64),
    /// Query succeeded but returned no datapoints
    NoData,
    /// Query failed
    Failed(String),
}

impl MetricReading {
    /// The reading as a number; both `NoData` and `Failed` read as zero
    pub fn value_or_zero(&self) -> f64 {
        match self {
            MetricReading::Value(value) => *value,
            MetricReading::NoData | MetricReading::Failed(_) => 0.0,
        }
    }
}

/// Runs metric queries against a monitoring client
pub struct MetricFetcher<'a, M: MonitoringApi + ?Sized> {
    client: &'a M,
    window: MetricWindow,
}

impl<'a, M: MonitoringApi + ?Sized> MetricFetcher<'a, M> {
    pub fn new(client: &'a M, window: MetricWindow) -> Self {
        Self { client, window }
    }

    /// Run `query` in `compartment_id` and classify the result
    pub async fn read(&self, compartment_id: &str, query: &MetricQuery) -> MetricReading {
        let details = query.details(self.window, Utc::now());

        let series = match self
            .client
            .summarize_metrics_data(compartment_id, &details)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(query = %query.query, error = %e, "Metric query failed");
                return MetricReading::Failed(e.to_string());
            }
        };

        match series
            .first()
            .and_then(|data| data.aggregated_datapoints.last())
        {
            Some(point) => {
                debug!(query = %query.query, value = point.value, "Metric datapoint");
                MetricReading::Value(point.value)
            }
            None => {
                debug!(query = %query.query, "Metric query returned no datapoints");
                MetricReading::NoData
            }
        }
    }

    /// Latest value of `query`, or `0.0` when there is none
    pub async fn fetch_value(&self, compartment_id: &str, query: &MetricQuery) -> f64 {
        self.read(compartment_id, query).await.value_or_zero()
    }
}
