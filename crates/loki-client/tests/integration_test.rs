// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::helpers::{
    create_ready_client, create_test_config, create_test_labels, submit_line, wait_for_match,
};
use loki_client::{CreateError, FlushError, LokiClient, Record, TransportError};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn full_batch_is_pushed_as_loki_json() {
    let mut server = Server::new_async().await;
    let ready = server
        .mock("GET", "/ready")
        .with_status(200)
        .create_async()
        .await;
    let push = server
        .mock("POST", "/loki/api/v1/push")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "streams": [
                {
                    "stream": { "env": "test", "job": "api" },
                    "values": [["1700000000000000000", "first \"quoted\" line"]]
                },
                {
                    "stream": { "env": "test", "job": "worker" },
                    "values": [["1700000000000000001", "{\"nested\": true}"]]
                }
            ]
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = create_ready_client(create_test_config(&server.url(), 2, HOUR)).await;
    submit_line(&client, "api", "1700000000000000000", "first \"quoted\" line").await;
    submit_line(&client, "worker", "1700000000000000001", "{\"nested\": true}").await;

    wait_for_match(&push, Duration::from_secs(2)).await;
    client.shutdown().await.unwrap();

    ready.assert_async().await;
    push.assert_async().await;
}

#[tokio::test]
async fn partial_batch_is_pushed_when_wait_expires() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ready")
        .with_status(200)
        .create_async()
        .await;
    let push = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::PartialJson(json!({
            "streams": [
                { "values": [["1", "one"]] },
                { "values": [["2", "two"]] }
            ]
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = create_ready_client(create_test_config(
        &server.url(),
        10,
        Duration::from_millis(100),
    ))
    .await;
    submit_line(&client, "api", "1", "one").await;
    submit_line(&client, "api", "2", "two").await;

    wait_for_match(&push, Duration::from_secs(2)).await;
    client.shutdown().await.unwrap();
    push.assert_async().await;
}

#[tokio::test]
async fn shutdown_pushes_pending_streams() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ready")
        .with_status(200)
        .create_async()
        .await;
    let push = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Regex("last words".to_string()))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = create_ready_client(create_test_config(&server.url(), 10, HOUR)).await;
    let handle = client.handle();
    submit_line(&client, "api", "1", "last words").await;
    client.shutdown().await.unwrap();

    push.assert_async().await;

    let late = handle
        .submit(loki_client::Stream::new(
            create_test_labels("api"),
            vec![Record::now("too late")],
        ))
        .await;
    assert!(late.is_err());
}

#[tokio::test]
async fn failed_push_is_reported_and_next_batch_still_ships() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ready")
        .with_status(200)
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Regex("poison".to_string()))
        .with_status(500)
        .with_body("ingester unavailable")
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Regex("healthy".to_string()))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = create_ready_client(create_test_config(&server.url(), 1, HOUR)).await;
    let mut errors = client.subscribe_flush_errors();

    submit_line(&client, "api", "1", "poison").await;
    let error = timeout(Duration::from_secs(2), errors.recv())
        .await
        .expect("flush failure should be reported")
        .unwrap();
    assert_eq!(
        error,
        FlushError::Push {
            streams: 1,
            source: TransportError::Status {
                status: 500,
                body: "ingester unavailable".to_string(),
            },
        }
    );

    submit_line(&client, "api", "2", "healthy").await;
    wait_for_match(&accepted, Duration::from_secs(2)).await;
    client.shutdown().await.unwrap();

    rejected.assert_async().await;
    accepted.assert_async().await;
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn not_ready_server_still_yields_client() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ready")
        .with_status(503)
        .with_body("Ingester not ready")
        .create_async()
        .await;
    let push = server
        .mock("POST", "/loki/api/v1/push")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let err = LokiClient::create(create_test_config(&server.url(), 10, HOUR))
        .await
        .unwrap_err();
    assert!(matches!(err, CreateError::NotReady { .. }));

    let client = err.into_client().unwrap();
    submit_line(&client, "api", "1", "shipped anyway").await;
    client.shutdown().await.unwrap();
    push.assert_async().await;
}

#[tokio::test]
async fn unreachable_server_reports_push_failure() {
    // Nothing listens on port 1
    let config = create_test_config("http://127.0.0.1:1", 1, HOUR);
    let err = LokiClient::create(config).await.unwrap_err();
    let client = err.into_client().expect("client is started even when unreachable");
    let mut errors = client.subscribe_flush_errors();

    submit_line(&client, "api", "1", "lost").await;
    let error = timeout(Duration::from_secs(5), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        error,
        FlushError::Push {
            source: TransportError::Request(_),
            ..
        }
    ));
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn tenant_header_is_sent() {
    let mut server = Server::new_async().await;
    let ready = server
        .mock("GET", "/ready")
        .match_header("X-Scope-OrgID", "team-a")
        .with_status(200)
        .create_async()
        .await;
    let push = server
        .mock("POST", "/loki/api/v1/push")
        .match_header("X-Scope-OrgID", "team-a")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let mut config = create_test_config(&server.url(), 1, HOUR);
    config.tenant_id = Some("team-a".to_string());
    let client = create_ready_client(config).await;
    submit_line(&client, "api", "1", "scoped").await;
    client.shutdown().await.unwrap();

    ready.assert_async().await;
    push.assert_async().await;
}
