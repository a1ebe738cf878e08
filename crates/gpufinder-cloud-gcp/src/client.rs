//! Compute Engine v1 REST client
//!
//! Direct REST implementation of [`ComputeApi`] using Bearer token
//! authentication.

use async_trait::async_trait;
use gpufinder_cloud::{
    AcceleratorType, CloudError, ComputeApi, InstanceResource, MachineType, Operation, Page, Zone,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Compute Engine client
pub struct GceClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GceClient {
    /// Create a client against the public endpoint
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, COMPUTE_API_BASE)
    }

    /// Create a client against a custom endpoint (e.g. a local emulator)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn project_url(&self, project: &str) -> String {
        format!("{}/projects/{}", self.base_url, project)
    }

    fn zone_url(&self, project: &str, zone: &str) -> String {
        format!("{}/zones/{}", self.project_url(project), zone)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> gpufinder_cloud::Result<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| CloudError::ApiError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudError::ApiError(e.to_string()))?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &body);
            tracing::debug!("Compute API returned {}: {}", status, err);
            return Err(err);
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: String,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<T>> {
        let mut request = self.client.get(&url);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        tracing::debug!("GET {} (page token: {:?})", url, page_token);
        self.send(request).await
    }
}

#[async_trait]
impl ComputeApi for GceClient {
    fn name(&self) -> &str {
        "gce"
    }

    async fn list_zones(
        &self,
        project: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<Zone>> {
        let url = format!("{}/zones", self.project_url(project));
        self.get_page(url, page_token).await
    }

    async fn list_machine_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<MachineType>> {
        let url = format!("{}/machineTypes", self.zone_url(project, zone));
        self.get_page(url, page_token).await
    }

    async fn list_accelerator_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<AcceleratorType>> {
        let url = format!("{}/acceleratorTypes", self.zone_url(project, zone));
        self.get_page(url, page_token).await
    }

    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        instance: &InstanceResource,
    ) -> gpufinder_cloud::Result<Operation> {
        let url = format!("{}/instances", self.zone_url(project, zone));
        tracing::debug!("POST {} ({})", url, instance.name);
        self.send(self.client.post(&url).json(instance)).await
    }

    async fn delete_instance(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> gpufinder_cloud::Result<Operation> {
        let url = format!("{}/instances/{}", self.zone_url(project, zone), instance);
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(&url)).await
    }

    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> gpufinder_cloud::Result<Operation> {
        let url = format!("{}/operations/{}", self.zone_url(project, zone), operation);
        self.send(self.client.get(&url)).await
    }
}

/// Turn a non-2xx response body into a [`CloudError::Http`]
///
/// Falls back to the raw body when it is not a Google error document.
pub fn parse_error(status: u16, body: &str) -> CloudError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => CloudError::Http {
            status,
            message: parsed.error.message,
            reasons: parsed
                .error
                .errors
                .into_iter()
                .filter_map(|e| e.reason)
                .collect(),
        },
        Err(_) => CloudError::http(status, body.trim()),
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}
