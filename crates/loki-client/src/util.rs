// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Utility functions for entry points configuring a client.

use crate::stream::Labels;

/// Parses a label string of the form `key=value,key2=value2`.
///
/// Whitespace around keys and values is trimmed and empty segments are
/// skipped. A later duplicate key overrides an earlier one.
///
/// # Returns
///
/// * `Some(Labels)` - The parsed labels, possibly empty for an empty input
/// * `None` - If a segment has no `=` or an empty key
///
/// # Examples
///
/// ```
/// use loki_client::util::parse_labels;
///
/// let labels = parse_labels("job=api, env=prod").unwrap();
/// assert_eq!(labels.get("env"), Some("prod"));
/// assert!(parse_labels("job").is_none());
/// ```
pub fn parse_labels(raw: &str) -> Option<Labels> {
    let mut labels = Labels::new();

    for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((key, value)) = segment.split_once('=') else {
            tracing::error!(
                "Label '{}' in '{}' is missing '='. Expected key=value pairs separated by commas.",
                segment,
                raw
            );
            return None;
        };

        let key = key.trim();
        if key.is_empty() {
            tracing::error!("Label '{}' in '{}' has an empty key.", segment, raw);
            return None;
        }
        labels.insert(key, value.trim());
    }

    Some(labels)
}
