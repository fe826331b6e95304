// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Loki HTTP API paths and client defaults.

use std::time::Duration;

/// Path of the Loki push API, relative to the base URL.
pub const PUSH_ENDPOINT: &str = "/loki/api/v1/push";

/// Path of the Loki readiness probe, relative to the base URL.
pub const READY_ENDPOINT: &str = "/ready";

/// Header carrying the tenant in multi-tenant Loki deployments.
pub const TENANT_HEADER: &str = "X-Scope-OrgID";

pub const DEFAULT_URL: &str = "http://localhost:3100";

/// Number of streams that triggers an immediate flush.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Longest time a non-empty batch waits before it is flushed.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(1);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the command channel between handles and the batch service.
///
/// Submitters still wait for the service to acknowledge each stream, so this
/// only bounds how many commands can be queued while a flush is in flight.
pub(crate) const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Upper bound on the streams reserved up front for a batch. Larger batches
/// grow on demand.
pub(crate) const MAX_PREALLOCATED_STREAMS: usize = 1024;

/// Deadline used when `max_wait` does not fit in an `Instant`, about 30 years.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Capacity of the flush error broadcast channel.
pub(crate) const FLUSH_ERROR_CHANNEL_CAPACITY: usize = 16;
