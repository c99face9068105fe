//! Compute backend for Oracle-compatible cloud APIs.
//!
//! [`OciBackend`] drives the provider's REST instances API directly: it
//! signs each request with the tenancy user's RSA key, follows the paginated
//! instance listing, and maps non-success responses into [`ServiceError`]
//! values that preserve the provider's diagnostic fields.

mod credentials;
mod signer;
mod types;


use std::time::Duration;

use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;

use crate::backend::{
    Backend, BackendFuture, ComputeError, InstanceSummary, LaunchRequest, LaunchedInstance,
    ServiceError,
};
use signer::{CONTENT_TYPE_JSON, sign_request};
use types::{ApiErrorBody, InstanceDetail, LaunchInstanceDetails};

pub use credentials::{Credentials, CredentialsError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "20160918";
const REQUEST_ID_HEADER: &str = "opc-request-id";
const NEXT_PAGE_HEADER: &str = "opc-next-page";
const LIST_OPERATION: &str = "list_instances";
const LAUNCH_OPERATION: &str = "launch_instance";

/// Compute backend speaking the provider's signed REST protocol.
#[derive(Clone, Debug)]
pub struct OciBackend {
    client: reqwest::Client,
    credentials: Credentials,
    endpoint: String,
    host: String,
}

impl OciBackend {
    /// Creates a backend targeting the region named in the credentials.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let endpoint = format!("https://iaas.{}.oraclecloud.com", credentials.region);
        let host = strip_scheme(&endpoint).to_owned();
        Self {
            client,
            credentials,
            endpoint,
            host,
        }
    }

    /// Overrides the API endpoint, e.g. to point at a local mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self.host = strip_scheme(&self.endpoint).to_owned();
        self
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.endpoint)
    }

    async fn send_signed(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Vec<u8>>,
        operation: &str,
    ) -> Result<reqwest::Response, ComputeError> {
        let signed = sign_request(
            &self.credentials,
            &method,
            &self.host,
            path_and_query,
            body.as_deref(),
        )
        .map_err(|err| transport_error(operation, &err))?;

        let mut request = self
            .client
            .request(method, self.request_url(path_and_query))
            .header("date", &signed.date)
            .header("authorization", &signed.authorization);
        if let Some(digest) = &signed.content_sha256 {
            request = request
                .header("x-content-sha256", digest)
                .header("content-type", CONTENT_TYPE_JSON);
        }
        if let Some(bytes) = body {
            request = request.body(bytes);
        }
        request
            .send()
            .await
            .map_err(|err| transport_error(operation, &err))
    }
}

impl Backend for OciBackend {
    fn list_instances(&self) -> BackendFuture<'_, Vec<InstanceSummary>> {
        Box::pin(async move {
            let mut instances = Vec::new();
            let mut page: Option<String> = None;
            loop {
                let path = list_instances_path(&self.credentials.tenancy, page.as_deref());
                let response = self
                    .send_signed(Method::GET, &path, None, LIST_OPERATION)
                    .await?;
                if !response.status().is_success() {
                    let url = self.request_url(&path);
                    return Err(service_error(LIST_OPERATION, &Method::GET, &url, response).await);
                }
                let next_page = header_value(&response, NEXT_PAGE_HEADER);
                let batch: Vec<InstanceDetail> = response
                    .json()
                    .await
                    .map_err(|err| transport_error(LIST_OPERATION, &err))?;
                instances.extend(batch.into_iter().map(InstanceSummary::from));
                match next_page {
                    Some(token) => page = Some(token),
                    None => return Ok(instances),
                }
            }
        })
    }

    fn launch_instance<'a>(&'a self, request: &'a LaunchRequest) -> BackendFuture<'a, LaunchedInstance> {
        Box::pin(async move {
            let path = format!("/{API_VERSION}/instances");
            let details = LaunchInstanceDetails::from_request(request);
            let body = serde_json::to_vec(&details)
                .map_err(|err| transport_error(LAUNCH_OPERATION, &err))?;
            let response = self
                .send_signed(Method::POST, &path, Some(body), LAUNCH_OPERATION)
                .await?;
            if !response.status().is_success() {
                let url = self.request_url(&path);
                return Err(service_error(LAUNCH_OPERATION, &Method::POST, &url, response).await);
            }
            let detail: InstanceDetail = response
                .json()
                .await
                .map_err(|err| transport_error(LAUNCH_OPERATION, &err))?;
            Ok(LaunchedInstance::from(detail))
        })
    }
}

/// Builds the list-instances path, percent-encoding the pagination token.
/// The token is opaque provider data; anything outside `[A-Za-z0-9]` must
/// not leak into the query string the signature covers.
fn list_instances_path(compartment_id: &str, page: Option<&str>) -> String {
    let mut path = format!("/{API_VERSION}/instances?compartmentId={compartment_id}");
    if let Some(token) = page {
        path.push_str("&page=");
        path.push_str(&utf8_percent_encode(token, NON_ALPHANUMERIC).to_string());
    }
    path
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

fn transport_error(operation: &str, err: &dyn std::fmt::Display) -> ComputeError {
    ComputeError::Transport {
        operation: operation.to_owned(),
        message: err.to_string(),
    }
}

/// Converts a non-success response into a [`ComputeError::Service`],
/// keeping the provider's error code, message, and request id.
async fn service_error(
    operation: &str,
    method: &Method,
    url: &str,
    response: reqwest::Response,
) -> ComputeError {
    let status = response.status().as_u16();
    let request_id = header_value(&response, REQUEST_ID_HEADER).unwrap_or_default();
    let body = response.bytes().await.unwrap_or_default();
    let (code, message) = serde_json::from_slice::<ApiErrorBody>(&body).map_or_else(
        |_| {
            (
                "Unknown".to_owned(),
                String::from_utf8_lossy(&body).into_owned(),
            )
        },
        |parsed| (parsed.code, parsed.message),
    );
    ComputeError::service(ServiceError {
        status,
        code,
        message,
        request_id,
        timestamp: Utc::now().to_rfc3339(),
        operation_name: operation.to_owned(),
        request_endpoint: format!("{method} {url}"),
    })
}
