// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Data model for log streams.
//!
//! A [`Stream`] is one submission: a [`Labels`] set plus the ordered
//! [`Record`]s that share it. Streams are immutable once built and are moved
//! into the batch service on submit.

use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single log line and the time it was produced.
///
/// The timestamp is kept as the decimal string of nanoseconds since the Unix
/// epoch, which is the form Loki expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    timestamp: String,
    line: String,
}

impl Record {
    pub fn new(timestamp: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            line: line.into(),
        }
    }

    /// Creates a record stamped with the current wall-clock time.
    pub fn now(line: impl Into<String>) -> Self {
        Self::at(SystemTime::now(), line)
    }

    /// Creates a record stamped with `time`. Times before the epoch clamp to 0.
    pub fn at(time: SystemTime, line: impl Into<String>) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        Self::new(nanos.to_string(), line)
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }
}

// Loki encodes each value as a `[timestamp, line]` pair.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.timestamp)?;
        pair.serialize_element(&self.line)?;
        pair.end()
    }
}

/// Label set attached to a stream.
///
/// Keys are unique and kept sorted so that the encoded payload is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label, returning the previous value for `key` if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One submission: a label set and its records in submission order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Stream {
    #[serde(rename = "stream")]
    labels: Labels,
    values: Vec<Record>,
}

impl Stream {
    #[must_use]
    pub fn new(labels: Labels, values: Vec<Record>) -> Self {
        Self { labels, values }
    }

    #[must_use]
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.values
    }

    /// Number of records in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
