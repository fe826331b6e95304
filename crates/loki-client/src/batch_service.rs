// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Actor that owns the pending batch and decides when to flush it.
//!
//! ```text
//!    ┌──────────────┐
//!    │ BatchHandles │ (Multiple producers)
//!    └──────┬───────┘
//!           │ Submit / Shutdown via bounded channel
//!           v
//!    ┌──────────────┐      deadline
//!    │ BatchService │ <──────────── Sleep (max_wait)
//!    └──────┬───────┘
//!           │ full batch or deadline
//!           v
//!    ┌──────────────┐
//!    │  Transport   │
//!    └──────────────┘
//! ```
//!
//! The service is the only code that touches the [`Batch`], and it handles one
//! event at a time: a submission, the deadline, or shutdown. A flush runs on
//! the service task itself, so while a push is in flight no submission is
//! acknowledged and producers are held back by the transport.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::batch::Batch;
use crate::config::BatchConfig;
use crate::constants::{COMMAND_CHANNEL_CAPACITY, FAR_FUTURE, FLUSH_ERROR_CHANNEL_CAPACITY};
use crate::error::{ClientError, FlushError};
use crate::payload;
use crate::stream::Stream;
use crate::transport::Transport;

/// Commands sent from handles to the service task.
#[derive(Debug)]
pub enum BatchCommand {
    /// Append a stream. `ack` fires once the service owns the stream.
    Submit {
        stream: Stream,
        ack: oneshot::Sender<()>,
    },

    /// Flush whatever is pending and stop.
    Shutdown,
}

/// Cloneable handle used by producers to submit streams.
#[derive(Clone, Debug)]
pub struct BatchHandle {
    tx: mpsc::Sender<BatchCommand>,
}

impl BatchHandle {
    /// Hands `stream` to the service.
    ///
    /// Returns once the service has appended the stream to its batch, not once
    /// the batch has been pushed. Fails with [`ClientError::ShutDown`] if the
    /// service has stopped or is stopping.
    pub async fn submit(&self, stream: Stream) -> Result<(), ClientError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(BatchCommand::Submit {
                stream,
                ack: ack_tx,
            })
            .await
            .map_err(|_| ClientError::ShutDown)?;

        // A dropped ack means the service rejected the stream while shutting down
        ack_rx.await.map_err(|_| ClientError::ShutDown)
    }

    /// Asks the service to drain and stop.
    pub(crate) async fn shutdown(&self) -> Result<(), ClientError> {
        self.tx
            .send(BatchCommand::Shutdown)
            .await
            .map_err(|_| ClientError::ShutDown)
    }

    /// Whether the service has stopped receiving commands.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Flush engine. Spawn [`BatchService::run`] and talk to it through
/// [`BatchHandle`]s.
pub struct BatchService {
    batch: Batch,
    config: BatchConfig,
    transport: Arc<dyn Transport>,
    rx: mpsc::Receiver<BatchCommand>,
    flush_errors: broadcast::Sender<FlushError>,
}

impl BatchService {
    /// Returns the service (to be spawned) and a handle (to send commands).
    #[must_use]
    pub fn new(config: BatchConfig, transport: Arc<dyn Transport>) -> (Self, BatchHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (flush_errors, _) = broadcast::channel(FLUSH_ERROR_CHANNEL_CAPACITY);

        let service = Self {
            batch: Batch::with_capacity(config.max_batch_size),
            config,
            transport,
            rx,
            flush_errors,
        };
        let handle = BatchHandle { tx };

        (service, handle)
    }

    /// Sender side of the flush error channel; subscribe to observe failures.
    #[must_use]
    pub fn flush_errors(&self) -> broadcast::Sender<FlushError> {
        self.flush_errors.clone()
    }

    /// Processes commands until shutdown.
    ///
    /// The service stops when a `Shutdown` command is received or when every
    /// handle has been dropped. In both cases the pending batch is flushed
    /// before returning.
    pub async fn run(mut self) {
        debug!("LOKI | Batch service started");

        let deadline = sleep_until(self.next_deadline());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(BatchCommand::Submit { stream, ack }) => {
                        self.batch.append(stream);
                        // The submitter may have stopped waiting; the stream is kept either way
                        let _ = ack.send(());

                        if self.batch.len() >= self.config.max_batch_size {
                            self.flush().await;
                            deadline.as_mut().reset(self.next_deadline());
                        }
                    }
                    Some(BatchCommand::Shutdown) => {
                        debug!("LOKI | Batch service shutting down");
                        break;
                    }
                    None => {
                        debug!("LOKI | All batch handles dropped, shutting down");
                        break;
                    }
                },
                () = &mut deadline => {
                    if !self.batch.is_empty() {
                        self.flush().await;
                    }
                    deadline.as_mut().reset(self.next_deadline());
                }
            }
        }

        self.terminate().await;
        debug!("LOKI | Batch service stopped");
    }

    /// `max_wait` from now, or a far-future instant if that overflows.
    fn next_deadline(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.config.max_wait)
            .unwrap_or_else(|| now + FAR_FUTURE)
    }

    /// Rejects submissions queued behind the shutdown and drains the batch.
    async fn terminate(&mut self) {
        self.rx.close();

        let mut rejected = 0;
        while let Ok(command) = self.rx.try_recv() {
            // Dropping the ack fails the pending submit with ShutDown
            if let BatchCommand::Submit { .. } = command {
                rejected += 1;
            }
        }
        if rejected > 0 {
            warn!("LOKI | Rejected {rejected} streams submitted after shutdown");
        }

        if !self.batch.is_empty() {
            self.flush().await;
        }
    }

    /// Pushes the pending batch and clears it, whatever the outcome.
    async fn flush(&mut self) {
        let streams = self.batch.take();
        let count = streams.len();
        debug!("LOKI | Flushing {count} streams");

        let result = match payload::encode(&streams) {
            Ok(body) => self
                .transport
                .send(body)
                .await
                .map_err(|source| FlushError::Push {
                    streams: count,
                    source,
                }),
            Err(e) => Err(FlushError::Encode {
                streams: count,
                message: e.to_string(),
            }),
        };

        match result {
            Ok(()) => debug!("LOKI | Successfully flushed {count} streams"),
            Err(e) => {
                error!("LOKI | {e}. Data dropped");
                // No subscribers is fine, the failure has been logged
                let _ = self.flush_errors.send(e);
            }
        }
    }
}
