// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use loki_client::{ClientConfig, Labels, LokiClient, Record};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Config pointing at `url` with short request timeouts.
pub fn create_test_config(url: &str, max_batch_size: usize, max_wait: Duration) -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_secs(2),
        ..ClientConfig::new(url, max_batch_size, max_wait)
    }
}

pub fn create_test_labels(job: &str) -> Labels {
    [("job", job), ("env", "test")].into_iter().collect()
}

/// Creates a client against a server that is expected to be ready.
pub async fn create_ready_client(config: ClientConfig) -> LokiClient {
    LokiClient::create(config)
        .await
        .expect("mock server should report ready")
}

pub async fn submit_line(client: &LokiClient, job: &str, timestamp: &str, line: &str) {
    client
        .submit(create_test_labels(job), vec![Record::new(timestamp, line)])
        .await
        .expect("submit should be accepted");
}

/// Polls `mock` until it has been hit, failing after `max_wait`.
pub async fn wait_for_match(mock: &mockito::Mock, max_wait: Duration) {
    let poll = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(20)).await;
        }
    };
    timeout(max_wait, poll)
        .await
        .expect("timed out before server received the push");
}
