// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Loki Client
//!
//! A client-side log shipper for Grafana Loki. Producers hand it labeled log
//! streams; a single background task batches them and pushes each batch to the
//! Loki push API once the batch is full or the wait deadline expires.
//!
//! ## Architecture
//!
//! ```text
//!   producers ──submit──> BatchHandle ──mpsc──> BatchService ──> Transport ──> Loki
//!                                                  │
//!                                                  └─ owns Batch (no locks)
//! ```
//!
//! - [`stream`]: records, labels and streams
//! - [`batch`]: the pending batch accumulator
//! - [`batch_service`]: the flush engine actor and its handle
//! - [`client`]: lifecycle (create, submit, shutdown)
//! - [`transport`]: network boundary and the HTTP implementation
//! - [`payload`]: JSON wire encoding of a batch

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batch;
pub mod batch_service;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod logger;
pub mod payload;
pub mod stream;
pub mod transport;
pub mod util;

pub use client::LokiClient;
pub use config::{BatchConfig, ClientConfig};
pub use error::{ClientError, CreateError, FlushError, TransportError};
pub use stream::{Labels, Record, Stream};
