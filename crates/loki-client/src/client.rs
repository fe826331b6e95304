// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Public entry point: create a client, submit streams, shut down.

use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::batch_service::{BatchHandle, BatchService};
use crate::config::ClientConfig;
use crate::error::{ClientError, CreateError, FlushError};
use crate::stream::{Labels, Record, Stream};
use crate::transport::{HttpTransport, Transport};

/// Batching Loki client.
///
/// Each client owns one background [`BatchService`] task. Streams submitted
/// through the client (or through handles from [`LokiClient::handle`]) are
/// pushed in submission order. [`LokiClient::shutdown`] consumes the client,
/// so it runs at most once.
pub struct LokiClient {
    url: String,
    handle: BatchHandle,
    flush_errors: broadcast::Sender<FlushError>,
    service_task: JoinHandle<()>,
}

impl LokiClient {
    /// Creates a client pushing to `config.url` over HTTP.
    ///
    /// The endpoint's readiness is checked once. If it is not ready the client
    /// is started anyway and returned inside [`CreateError::NotReady`], leaving
    /// the caller to decide whether to proceed.
    pub async fn create(config: ClientConfig) -> Result<Self, CreateError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Creates a client on top of an existing transport.
    pub async fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CreateError> {
        config.batch.validate()?;

        let ready = transport.is_ready().await;

        let (service, handle) = BatchService::new(config.batch, transport);
        let flush_errors = service.flush_errors();
        let service_task = tokio::spawn(service.run());

        let client = Self {
            url: config.base_url().to_string(),
            handle,
            flush_errors,
            service_task,
        };

        if ready {
            info!("LOKI | Client started for {}", client.url);
            Ok(client)
        } else {
            warn!("LOKI | The server on {} isn't ready", client.url);
            Err(CreateError::NotReady {
                url: client.url.clone(),
                client: Box::new(client),
            })
        }
    }

    /// Submits one stream built from `labels` and `records`.
    ///
    /// Returns once the batch service has taken the stream; delivery failures
    /// are reported later through [`LokiClient::subscribe_flush_errors`].
    pub async fn submit(&self, labels: Labels, records: Vec<Record>) -> Result<(), ClientError> {
        self.handle.submit(Stream::new(labels, records)).await
    }

    /// A cloneable handle for submitting from other tasks.
    ///
    /// Handles outliving the client fail with [`ClientError::ShutDown`].
    #[must_use]
    pub fn handle(&self) -> BatchHandle {
        self.handle.clone()
    }

    /// Receives every flush failure that happens after this call.
    #[must_use]
    pub fn subscribe_flush_errors(&self) -> broadcast::Receiver<FlushError> {
        self.flush_errors.subscribe()
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stops accepting streams, flushes what is pending and waits for the
    /// batch service to exit.
    pub async fn shutdown(self) -> Result<(), ClientError> {
        if self.handle.shutdown().await.is_err() {
            debug!("LOKI | Batch service already stopped");
        }

        self.service_task
            .await
            .map_err(|e| ClientError::Runtime(format!("Batch service task failed: {e}")))?;

        info!("LOKI | Client for {} shut down", self.url);
        Ok(())
    }
}

impl fmt::Debug for LokiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LokiClient")
            .field("url", &self.url)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
