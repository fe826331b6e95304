// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use loki_client::{
    logger::Formatter, util::parse_labels, ClientConfig, CreateError, FlushError, Labels,
    LokiClient, Record,
};

const DEFAULT_LABELS: &str = "job=loki-shipper";

#[tokio::main]
pub async fn main() -> ExitCode {
    let log_level = env::var("LOKI_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{}", log_level);

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .event_format(Formatter::default())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("LOKI_SHIPPER | ERROR | setting default subscriber failed: {e}");
    }

    debug!("Logging subsystem enabled");

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating config on loki shipper startup: {e}");
            return ExitCode::FAILURE;
        }
    };

    let raw_labels = env::var("LOKI_LABELS").unwrap_or(DEFAULT_LABELS.to_string());
    let Some(labels) = parse_labels(&raw_labels) else {
        error!("Unable to parse LOKI_LABELS, shutting down");
        return ExitCode::FAILURE;
    };

    let client = match LokiClient::create(config).await {
        Ok(client) => client,
        Err(CreateError::NotReady { url, client }) => {
            warn!("Loki on {url} isn't ready yet, shipping anyway");
            *client
        }
        Err(e) => {
            error!("Unable to start loki client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dropped_counter = count_dropped_streams(client.subscribe_flush_errors());

    let shipped = ship_stdin(&client, &labels)
        .instrument(info_span!("ship", source = "stdin"))
        .await;

    if let Err(e) = client.shutdown().await {
        error!("Error shutting down loki client: {e}");
        return ExitCode::FAILURE;
    }

    // The client is gone, so the error channel is closed and the counter ends
    let dropped = dropped_counter.await.unwrap_or_default();
    info!("Shipped {shipped} lines, {dropped} streams dropped by failed pushes");

    if dropped > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Submits one stream per stdin line until EOF or Ctrl-C. Returns the number
/// of lines accepted by the client.
async fn ship_stdin(client: &LokiClient, labels: &Labels) -> usize {
    let mut lines = BufReader::new(io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shipped = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl-C, stopping");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(e) = client.submit(labels.clone(), vec![Record::now(line)]).await {
                        error!("Unable to submit line: {e}");
                        break;
                    }
                    shipped += 1;
                }
                Ok(None) => {
                    debug!("Reached end of input");
                    break;
                }
                Err(e) => {
                    error!("Error reading stdin: {e}");
                    break;
                }
            }
        }
    }
    shipped
}

fn count_dropped_streams(mut errors: broadcast::Receiver<FlushError>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut dropped = 0;
        loop {
            match errors.recv().await {
                Ok(e) => dropped += e.streams(),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {missed} flush error reports");
                }
                Err(RecvError::Closed) => break,
            }
        }
        dropped
    })
}
