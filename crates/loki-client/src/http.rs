// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared reqwest client construction.
//!
//! The client carries the request timeout, connection pooling with TCP
//! keep-alive, rustls TLS and the optional HTTPS proxy. An invalid proxy is
//! logged and the client falls back to a direct connection, so a bad proxy
//! setting never keeps logs from being shipped.

use crate::config::ClientConfig;
use core::time::Duration;
use tracing::error;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(270);
const TCP_KEEPALIVE: Duration = Duration::from_secs(120);

/// Creates the HTTP client used by [`crate::transport::HttpTransport`].
#[must_use]
pub fn get_client(config: &ClientConfig) -> reqwest::Client {
    match build_client(config, true) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "LOKI | Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client(config, false) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "LOKI | Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &ClientConfig, allow_proxy: bool) -> Result<reqwest::Client, reqwest::Error> {
    let mut client = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.timeout)
        .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
        .tcp_keepalive(Some(TCP_KEEPALIVE));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            client = client.proxy(reqwest::Proxy::https(https_uri.as_str())?);
        }
    }

    client.build()
}
