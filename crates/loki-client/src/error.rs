// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::client::LokiClient;

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Batch service has shut down")]
    ShutDown,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Errors returned by [`LokiClient::create`].
///
/// An unreachable endpoint does not prevent the client from starting: the
/// running client travels inside [`CreateError::NotReady`] and can be recovered
/// with [`CreateError::into_client`].
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("The server on {url} isn't ready")]
    NotReady { url: String, client: Box<LokiClient> },
}

impl CreateError {
    /// Returns the started client, if one was created.
    #[must_use]
    pub fn into_client(self) -> Option<LokiClient> {
        match self {
            Self::NotReady { client, .. } => Some(*client),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<ClientError> for CreateError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidConfig(message) => Self::InvalidConfig(message),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}

/// Failure of a single push.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure of one flush cycle. The batch it refers to has been dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlushError {
    #[error("failed to encode batch of {streams} streams: {message}")]
    Encode { streams: usize, message: String },

    #[error("failed to push batch of {streams} streams: {source}")]
    Push {
        streams: usize,
        #[source]
        source: TransportError,
    },
}

impl FlushError {
    /// Number of streams lost with the failed batch.
    #[must_use]
    pub fn streams(&self) -> usize {
        match self {
            Self::Encode { streams, .. } | Self::Push { streams, .. } => *streams,
        }
    }
}
