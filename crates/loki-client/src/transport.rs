// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Network boundary of the client.
//!
//! The batch service only sees the [`Transport`] trait: it hands over a fully
//! encoded payload and learns whether it was delivered. [`HttpTransport`] is
//! the implementation that talks to the Loki HTTP API. Retries are not part of
//! this contract; a transport that wants them can wrap another transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::constants::{PUSH_ENDPOINT, READY_ENDPOINT, TENANT_HEADER};
use crate::error::{ClientError, TransportError};
use crate::http::get_client;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Pushes one encoded batch. Any non-success outcome is an error.
    async fn send(&self, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Liveness probe used when the client is created.
    async fn is_ready(&self) -> bool;
}

/// [`Transport`] over the Loki HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    push_url: String,
    ready_url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url();

        let mut headers = HeaderMap::new();
        if let Some(tenant_id) = &config.tenant_id {
            let value = HeaderValue::from_str(tenant_id).map_err(|e| {
                ClientError::InvalidConfig(format!("invalid tenant id '{tenant_id}': {e}"))
            })?;
            headers.insert(TENANT_HEADER, value);
        }

        Ok(Self {
            client: get_client(config),
            push_url: format!("{base_url}{PUSH_ENDPOINT}"),
            ready_url: format!("{base_url}{READY_ENDPOINT}"),
            headers,
        })
    }

    #[must_use]
    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    #[must_use]
    pub fn ready_url(&self) -> &str {
        &self.ready_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(&self.push_url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // Only read the body on failure, it carries Loki's reason
        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn is_ready(&self) -> bool {
        match self
            .client
            .get(&self.ready_url)
            .headers(self.headers.clone())
            .send()
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                debug!("LOKI | {} answered {}", self.ready_url, resp.status());
                false
            }
            Err(e) => {
                error!("LOKI | Readiness check against {} failed: {}", self.ready_url, e);
                false
            }
        }
    }
}
