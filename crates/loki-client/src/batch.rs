// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pending batch of streams waiting to be flushed.
//!
//! The batch has no synchronization of its own: it is owned and mutated only
//! by the [`crate::batch_service::BatchService`] task.

use crate::constants::MAX_PREALLOCATED_STREAMS;
use crate::stream::Stream;

/// Streams appended since the last flush, in submission order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    streams: Vec<Stream>,
}

impl Batch {
    /// Reserves room for `capacity` streams, up to a fixed bound.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            streams: Vec::with_capacity(capacity.min(MAX_PREALLOCATED_STREAMS)),
        }
    }

    /// Adds a stream to the end of the batch.
    pub fn append(&mut self, stream: Stream) {
        self.streams.push(stream);
    }

    /// Drops every pending stream.
    pub fn clear(&mut self) {
        self.streams.clear();
    }

    /// Removes and returns the pending streams, leaving the batch empty.
    ///
    /// The next batch starts with as much room as this one, up to a fixed bound.
    pub fn take(&mut self) -> Vec<Stream> {
        let capacity = self.streams.capacity().min(MAX_PREALLOCATED_STREAMS);
        std::mem::replace(&mut self.streams, Vec::with_capacity(capacity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Number of streams appended since the last flush.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }
}
