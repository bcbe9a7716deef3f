//! reqwest-backed implementation of the operation and artifact clients.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::config::AccountConfig;

use super::error::{truncate_body, ClientError, Result};
use super::{
    id_from_location, AcceptedOperation, ArtifactClient, OperationKind, OperationSource,
    OperationUpdate, StageClient, StageInput, StageKind,
};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout. Generous because the upload stage carries an entire
/// drawing package in one request body.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

fn create_http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(ClientError::Build)
}

#[derive(Deserialize)]
struct OperationStatusBody {
    status: super::OperationStatus,
}

/// Issues signed REST calls against one account's gateway. No retries at
/// this layer; failures propagate with the response body attached.
pub struct HttpOperationClient {
    http: Client,
    config: AccountConfig,
}

impl HttpOperationClient {
    pub fn new(config: AccountConfig) -> Result<Self> {
        Ok(Self {
            http: create_http_client()?,
            config,
        })
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.config.domain, path)
    }

    /// Query parameters that accompany every request.
    fn signed_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api-version", self.config.api_version.clone()),
            ("subscription-key", self.config.subscription_key.clone()),
        ]
    }

    fn header_id(response: &Response, name: &str) -> Option<String> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(id_from_location)
    }

    async fn rejection_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl StageClient for HttpOperationClient {
    async fn start(&self, stage: StageKind, input: StageInput) -> Result<AcceptedOperation> {
        let url = self.url(stage.collection_path());
        let mut query = self.signed_query();

        let request = match (stage, input) {
            (StageKind::Data, StageInput::Package(package)) => {
                query.push(("dataFormat", "dwgzippackage".to_string()));
                self.http
                    .post(&url)
                    .query(&query)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(package)
            }
            (StageKind::Conversion, StageInput::Resource(udid)) => {
                query.push(("udid", udid));
                query.push(("outputOntology", "facility-2.0".to_string()));
                self.http.post(&url).query(&query)
            }
            (StageKind::Dataset, StageInput::Resource(conversion_id)) => {
                query.push(("conversionId", conversion_id));
                self.http.post(&url).query(&query)
            }
            (StageKind::Tileset, StageInput::Resource(dataset_id)) => {
                query.push(("datasetId", dataset_id));
                self.http.post(&url).query(&query)
            }
            (stage, _) => return Err(ClientError::InvalidStageInput { stage }),
        };

        let response = request.send().await?;
        match response.status().as_u16() {
            202 => {
                let operation_id = Self::header_id(&response, "operation-location")
                    .ok_or(ClientError::MissingOperationLocation { stage })?;
                debug!("{} operation accepted: {}", stage, operation_id);
                Ok(AcceptedOperation { operation_id })
            }
            status => {
                let body = Self::rejection_body(response).await;
                warn!("{} start rejected ({}): {}", stage, status, truncate_body(&body));
                Err(ClientError::StartRejected {
                    stage,
                    status,
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl OperationSource for HttpOperationClient {
    async fn poll_once(&self, kind: OperationKind, operation_id: &str) -> Result<OperationUpdate> {
        let url = self.url(&format!("{}/operations/{}", kind.collection(), operation_id));
        let response = self.http.get(&url).query(&self.signed_query()).send().await?;

        match response.status().as_u16() {
            200 => {
                let resource_id = Self::header_id(&response, "resource-location");
                let body: OperationStatusBody = response.json().await?;
                debug!(
                    "{} operation {} is {}",
                    kind, operation_id, body.status
                );
                Ok(OperationUpdate {
                    status: body.status,
                    resource_id,
                })
            }
            status => {
                let body = Self::rejection_body(response).await;
                warn!(
                    "{} operation {} poll failed ({}): {}",
                    kind,
                    operation_id,
                    status,
                    truncate_body(&body)
                );
                Err(ClientError::PollRejected {
                    kind,
                    operation_id: operation_id.to_string(),
                    status,
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl ArtifactClient for HttpOperationClient {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(self.url(path))
            .query(&self.signed_query())
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = Self::rejection_body(response).await;
            return Err(ClientError::RequestRejected {
                path: path.to_string(),
                status,
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn get_bytes(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(path))
            .query(&self.signed_query())
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = Self::rejection_body(response).await;
            return Err(ClientError::RequestRejected {
                path: path.to_string(),
                status,
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn create_artifact(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<AcceptedOperation> {
        let response = self
            .http
            .post(self.url(path))
            .query(&self.signed_query())
            .query(query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        match response.status().as_u16() {
            202 => {
                let operation_id =
                    Self::header_id(&response, "operation-location").ok_or_else(|| {
                        ClientError::UploadRejected {
                            status: 202,
                            body: "accepted without an operation-location header".to_string(),
                        }
                    })?;
                debug!("artifact create accepted at {}: {}", path, operation_id);
                Ok(AcceptedOperation { operation_id })
            }
            status => {
                let body = Self::rejection_body(response).await;
                warn!(
                    "artifact create at {} rejected ({}): {}",
                    path,
                    status,
                    truncate_body(&body)
                );
                Err(ClientError::UploadRejected { status, body })
            }
        }
    }

    async fn delete_artifact(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(path))
            .query(&self.signed_query())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = Self::rejection_body(response).await;
            return Err(ClientError::RequestRejected {
                path: path.to_string(),
                status,
                body,
            });
        }

        debug!("deleted artifact at {}", path);
        Ok(())
    }
}
