//! HTTP transport for the periodicals service.

use std::sync::Arc;

use periodicals_runtime::proto::{
    BasicRequestInfo, ContractSeasonInfos, GetPeriodicalsRequest, PeriodicalsResponse,
};
use periodicals_runtime::{decode_response, decode_transport_body, encode_request, DecodeError};
use prost::Message;
use reqwest::Client;
use thiserror::Error;

use crate::config::PeriodicalsConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },
}

/// Thin client for the two snapshot endpoints. Failed calls are not retried.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    config: Arc<PeriodicalsConfig>,
    client: Client,
}

impl RemoteFetcher {
    pub fn new(config: Arc<PeriodicalsConfig>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.endpoints().request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PeriodicalsConfig {
        &self.config
    }

    /// Request body shared by both endpoints.
    pub fn periodicals_request(&self) -> GetPeriodicalsRequest {
        let client = self.config.client();
        let user_id = self.config.user_id().to_string();
        GetPeriodicalsRequest {
            user_id: Some(user_id.clone()),
            current_client_version: Some(client.current_client_version()),
            rinfo: Some(BasicRequestInfo {
                ei_user_id: Some(user_id),
                client_version: Some(client.client_version()),
                version: Some(client.version().to_string()),
                build: Some(client.build().to_string()),
                platform: Some(client.platform().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub async fn fetch_periodicals(&self) -> Result<PeriodicalsResponse, FetchError> {
        let url = self.config.endpoints().periodicals_url();
        self.post_authenticated(url).await
    }

    pub async fn fetch_season_infos(&self) -> Result<ContractSeasonInfos, FetchError> {
        let url = self.config.endpoints().season_info_url();
        self.post_authenticated(url).await
    }

    /// GET a resource, rejecting non-success statuses.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_authenticated<M>(&self, url: &str) -> Result<M, FetchError>
    where
        M: Message + Default,
    {
        let payload = encode_request(&self.periodicals_request());
        let response = self
            .client
            .post(url)
            .form(&[("data", payload)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope = decode_transport_body(&body);
        let message = decode_response(&envelope, true).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;

        tracing::info!(
            target: "periodicals::fetch",
            url,
            bytes = body.len(),
            "fetch.completed"
        );
        Ok(message)
    }
}
