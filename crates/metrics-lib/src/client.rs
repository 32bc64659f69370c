//! REST client for the provider's compute and monitoring services
//!
//! The two services sit behind [`ComputeApi`] and [`MonitoringApi`] so the
//! metric fetcher and instance processor can be exercised without a network.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{Instance, MetricData, SummarizeMetricsDataDetails};
use crate::signer::{RequestSigner, SignerError, JSON_CONTENT_TYPE};

/// API version path segment of the compute service
const COMPUTE_API_VERSION: &str = "20160918";
/// API version path segment of the monitoring service
const MONITORING_API_VERSION: &str = "20180401";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum OciError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code} ({status}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Signing(#[from] SignerError),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("instance {0} reports no agent plugin configuration")]
    MissingAgentConfig(String),
}

/// Error payload returned by the provider on non-2xx responses
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    code: String,
    message: String,
}

/// Compute service operations used by the exporter
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Fetch one instance by its identifier
    async fn get_instance(&self, instance_id: &str) -> Result<Instance, OciError>;
}

/// Monitoring service operations used by the exporter
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Run an aggregation query over a time window
    async fn summarize_metrics_data(
        &self,
        compartment_id: &str,
        details: &SummarizeMetricsDataDetails,
    ) -> Result<Vec<MetricData>, OciError>;
}

/// Service base URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub compute: Url,
    pub monitoring: Url,
}

impl Endpoints {
    /// Public endpoints of a commercial-realm region
    pub fn for_region(region: &str) -> Result<Self, OciError> {
        Ok(Self {
            compute: parse_endpoint(&format!("https://iaas.{}.oraclecloud.com", region))?,
            monitoring: parse_endpoint(&format!("https://telemetry.{}.oraclecloud.com", region))?,
        })
    }

    pub fn with_compute(mut self, endpoint: &str) -> Result<Self, OciError> {
        self.compute = parse_endpoint(endpoint)?;
        Ok(self)
    }

    pub fn with_monitoring(mut self, endpoint: &str) -> Result<Self, OciError> {
        self.monitoring = parse_endpoint(endpoint)?;
        Ok(self)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, OciError> {
    let url = Url::parse(endpoint).map_err(|e| OciError::Endpoint(format!("{}: {}", endpoint, e)))?;
    if url.cannot_be_a_base() {
        return Err(OciError::Endpoint(endpoint.to_string()));
    }
    Ok(url)
}

/// Signed client for both services
pub struct OciClient {
    http: Client,
    signer: RequestSigner,
    endpoints: Endpoints,
}

impl OciClient {
    /// Create a new client
    pub fn new(
        signer: RequestSigner,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, OciError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oci-metrics/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            signer,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Sign and send a request, decoding a JSON response
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T, OciError> {
        let signed = self
            .signer
            .sign(&method, &url, body.as_deref(), Utc::now())?;

        debug!(%method, %url, key_id = self.signer.key_id(), "Sending signed request");

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header("date", signed.date)
            .header(AUTHORIZATION, signed.authorization);

        if let (Some(body), Some(digest)) = (body, signed.content_sha256) {
            request = request
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .header("x-content-sha256", digest)
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_slice::<ServiceErrorBody>(&bytes) {
                Ok(err) => (err.code, err.message),
                Err(_) => (
                    status.canonical_reason().unwrap_or("Unknown").to_string(),
                    String::from_utf8_lossy(&bytes).into_owned(),
                ),
            };
            return Err(OciError::Service {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Append path segments to a service base URL
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, OciError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| OciError::Endpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl ComputeApi for OciClient {
    async fn get_instance(&self, instance_id: &str) -> Result<Instance, OciError> {
        let url = endpoint_url(
            &self.endpoints.compute,
            &[COMPUTE_API_VERSION, "instances", instance_id],
        )?;
        self.send(Method::GET, url, None).await
    }
}

#[async_trait]
impl MonitoringApi for OciClient {
    async fn summarize_metrics_data(
        &self,
        compartment_id: &str,
        details: &SummarizeMetricsDataDetails,
    ) -> Result<Vec<MetricData>, OciError> {
        let mut url = endpoint_url(
            &self.endpoints.monitoring,
            &[MONITORING_API_VERSION, "metrics", "actions", "summarizeMetricsData"],
        )?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);

        let body = serde_json::to_vec(details)?;
        self.send(Method::POST, url, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    const TEST_KEY: &[u8] = include_bytes!("../tests/fixtures/test_key.pem");

    const INSTANCE_JSON: &str = r#"{
        "id": "ocid1.instance.oc1..a",
        "displayName": "app-server",
        "compartmentId": "ocid1.compartment.oc1..c",
        "lifecycleState": "RUNNING",
        "agentConfig": {
            "pluginsConfig": [
                {"name": "Compute Instance Monitoring", "desiredState": "ENABLED"}
            ]
        }
    }"#;

    fn test_client(base: &str) -> OciClient {
        let signer = RequestSigner::from_pem("t/u/f".to_string(), TEST_KEY).unwrap();
        let endpoints = Endpoints::for_region("us-ashburn-1")
            .unwrap()
            .with_compute(base)
            .unwrap()
            .with_monitoring(base)
            .unwrap();
        OciClient::new(signer, endpoints, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoints_for_region() {
        let endpoints = Endpoints::for_region("eu-frankfurt-1").unwrap();
        assert_eq!(
            endpoints.compute.as_str(),
            "https://iaas.eu-frankfurt-1.oraclecloud.com/"
        );
        assert_eq!(
            endpoints.monitoring.as_str(),
            "https://telemetry.eu-frankfurt-1.oraclecloud.com/"
        );
    }

    #[test]
    fn test_endpoint_override_rejects_garbage() {
        let endpoints = Endpoints::for_region("eu-frankfurt-1").unwrap();
        assert!(endpoints.clone().with_compute("not a url").is_err());
        assert!(endpoints.with_monitoring("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let base = Url::parse("http://localhost:9000/proxy/").unwrap();
        let url = endpoint_url(&base, &["20160918", "instances", "ocid1.instance.oc1..a"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/proxy/20160918/instances/ocid1.instance.oc1..a"
        );
    }

    #[tokio::test]
    async fn test_get_instance() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/20160918/instances/ocid1.instance.oc1..a")
            .match_header(
                "authorization",
                Matcher::Regex(
                    r#"^Signature version="1",keyId="t/u/f",algorithm="rsa-sha256",headers="date \(request-target\) host",signature="[A-Za-z0-9+/=]+"$"#
                        .to_string(),
                ),
            )
            .match_header("date", Matcher::Regex("GMT$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(INSTANCE_JSON)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let instance = client.get_instance("ocid1.instance.oc1..a").await.unwrap();

        mock.assert_async().await;
        assert_eq!(instance.display_name, "app-server");
        assert_eq!(instance.compartment_id, "ocid1.compartment.oc1..c");
        assert_eq!(instance.monitoring_desired_state(), Some("ENABLED"));
    }

    #[tokio::test]
    async fn test_get_instance_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/20160918/instances/ocid1.instance.oc1..missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"NotAuthorizedOrNotFound","message":"Authorization failed or requested resource not found."}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get_instance("ocid1.instance.oc1..missing")
            .await
            .unwrap_err();

        match err {
            OciError::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "NotAuthorizedOrNotFound");
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_service_error_without_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/20160918/instances/ocid1.instance.oc1..a")
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.get_instance("ocid1.instance.oc1..a").await.unwrap_err();

        assert!(matches!(err, OciError::Service { status: 502, .. }));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_summarize_metrics_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/20180401/metrics/actions/summarizeMetricsData")
            .match_query(Matcher::UrlEncoded(
                "compartmentId".to_string(),
                "ocid1.compartment.oc1..c".to_string(),
            ))
            .match_header("content-type", "application/json")
            .match_header("x-content-sha256", Matcher::Regex(".+".to_string()))
            .match_header(
                "authorization",
                Matcher::Regex(
                    r#"headers="date \(request-target\) host content-length content-type x-content-sha256""#
                        .to_string(),
                ),
            )
            .match_body(Matcher::PartialJson(serde_json::json!({
                "namespace": "oci_computeagent",
                "query": "CpuUtilization[1m]{resourceId=\"ocid1.instance.oc1..a\"}.mean()",
                "resolution": "1m"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{
                    "namespace": "oci_computeagent",
                    "name": "CpuUtilization",
                    "aggregatedDatapoints": [
                        {"timestamp": "2024-03-05T14:03:00Z", "value": 3.5},
                        {"timestamp": "2024-03-05T14:04:00Z", "value": 4.25}
                    ]
                }]"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let details = SummarizeMetricsDataDetails {
            namespace: "oci_computeagent".to_string(),
            query: "CpuUtilization[1m]{resourceId=\"ocid1.instance.oc1..a\"}.mean()".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 3, 5, 14, 5, 0).unwrap(),
            resolution: "1m".to_string(),
        };

        let data = client
            .summarize_metrics_data("ocid1.compartment.oc1..c", &details)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].aggregated_datapoints.len(), 2);
        assert_eq!(data[0].aggregated_datapoints[1].value, 4.25);
    }
}
