// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! JSON encoding of a batch for the Loki push API.
//!
//! ```json
//! {
//!   "streams": [
//!     {
//!       "stream": { "label": "value" },
//!       "values": [ [ "<unix epoch in nanoseconds>", "<log line>" ] ]
//!     }
//!   ]
//! }
//! ```
//!
//! Labels and lines go through `serde_json`, so arbitrary content (quotes,
//! newlines, embedded JSON) is escaped correctly.

use crate::stream::Stream;
use serde::Serialize;

#[derive(Serialize)]
struct PushRequest<'a> {
    streams: &'a [Stream],
}

/// Serializes `streams` into a push request body.
pub fn encode(streams: &[Stream]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&PushRequest { streams })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Labels, Record};
    use serde_json::{json, Value};

    #[test]
    fn test_encode_matches_push_format() {
        let streams = vec![
            Stream::new(
                [("job", "api"), ("env", "prod")].into_iter().collect::<Labels>(),
                vec![Record::new("1", "started"), Record::new("2", "ready")],
            ),
            Stream::new(
                [("job", "worker")].into_iter().collect::<Labels>(),
                vec![Record::new("3", "tick")],
            ),
        ];

        let body: Value = serde_json::from_slice(&encode(&streams).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "streams": [
                    {
                        "stream": { "env": "prod", "job": "api" },
                        "values": [["1", "started"], ["2", "ready"]]
                    },
                    {
                        "stream": { "job": "worker" },
                        "values": [["3", "tick"]]
                    }
                ]
            })
        );
    }

    #[test]
    fn test_encode_escapes_structured_content() {
        let line = "{\"msg\": \"hi\"}\n\ttab \\ backslash";
        let streams = vec![Stream::new(
            [("quote\"key", "va\"lue")].into_iter().collect::<Labels>(),
            vec![Record::new("1", line)],
        )];

        let body: Value = serde_json::from_slice(&encode(&streams).unwrap()).unwrap();
        assert_eq!(body["streams"][0]["values"][0][1], line);
        assert_eq!(body["streams"][0]["stream"]["quote\"key"], "va\"lue");
    }

    #[test]
    fn test_label_order_is_deterministic() {
        let a: Labels = [("b", "2"), ("a", "1")].into_iter().collect();
        let b: Labels = [("a", "1"), ("b", "2")].into_iter().collect();

        let encoded_a = encode(&[Stream::new(a, Vec::new())]).unwrap();
        let encoded_b = encode(&[Stream::new(b, Vec::new())]).unwrap();
        assert_eq!(encoded_a, encoded_b);
    }
}
