//! Library for exporting compute instance metrics
//!
//! This crate provides the core functionality for:
//! - Credential profile loading and request signing
//! - Compute and monitoring REST calls
//! - Metric fetching and agent-status classification
//! - JSON and spreadsheet output

pub mod client;
pub mod config;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod output;
pub mod processor;
pub mod signer;

pub use client::{ComputeApi, Endpoints, MonitoringApi, OciClient, OciError};
pub use crate::config::{ConfigError, OciConfig};
pub use metrics::{MetricFetcher, MetricQuery, MetricReading, MetricWindow};
pub use models::*;
pub use output::{write_json, write_xlsx, OutputError};
pub use processor::{InstanceFailure, InstanceProcessor, ProcessReport};
pub use signer::{RequestSigner, SignerError};
