//! HTTP implementation of [`DeviceGateway`].

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use brewhub_app::ports::DeviceGateway;
use brewhub_domain::device::{Block, DeviceRef};
use brewhub_domain::error::BrewhubError;

use crate::config::SparkConfig;
use crate::error::SparkError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockIdentity<'a> {
    id: &'a str,
    service_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockPatch<'a> {
    id: &'a str,
    service_id: &'a str,
    data: &'a serde_json::Value,
}

/// Device gateway backed by the Spark block API.
#[derive(Clone)]
pub struct SparkGateway {
    http: Client,
    config: SparkConfig,
}

impl SparkGateway {
    /// # Errors
    ///
    /// Returns [`SparkError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SparkConfig) -> Result<Self, SparkError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, service_id: &str, path: &str) -> String {
        format!(
            "{}/{service_id}/{path}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn post<B: Serialize>(
        &self,
        device: &DeviceRef,
        path: &str,
        body: &B,
    ) -> Result<Block, SparkError> {
        let response = self
            .http
            .post(self.url(&device.service_id, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SparkError::Status {
                status: status.as_u16(),
                block_id: device.id.clone(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response.json().await?)
    }
}

impl DeviceGateway for SparkGateway {
    fn read(&self, device: &DeviceRef) -> impl Future<Output = Result<Block, BrewhubError>> + Send {
        async move {
            let body = BlockIdentity {
                id: &device.id,
                service_id: &device.service_id,
            };
            Ok(self.post(device, "blocks/read", &body).await?)
        }
    }

    fn patch(
        &self,
        device: &DeviceRef,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Block, BrewhubError>> + Send {
        async move {
            let body = BlockPatch {
                id: &device.id,
                service_id: &device.service_id,
                data: &data,
            };
            let block = self.post(device, "blocks/patch", &body).await?;
            tracing::debug!(device_id = %device.id, "block patched");
            Ok(block)
        }
    }

    fn is_ready(&self) -> impl Future<Output = bool> + Send {
        async move {
            let url = self.url(&self.config.service_id, "system/ping");
            match self.http.get(url).send().await {
                Ok(response) => response.status().is_success(),
                Err(err) => {
                    tracing::debug!(error = %err, "spark ping failed");
                    false
                }
            }
        }
    }
}
