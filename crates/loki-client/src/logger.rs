// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tracing formatter for processes embedding the client.
//!
//! Lines look like:
//!
//! ```text
//! LOKI_SHIPPER | INFO | LOKI | Client started for http://localhost:3100
//! LOKI_SHIPPER | ERROR | ship{source="stdin"}: LOKI | failed to push batch of 2 streams: 500: boom
//! ```
//!
//! so the shipper's own diagnostics are easy to tell apart from the log lines
//! it forwards when both end up in the same place.

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;

/// Prefix used by [`Formatter::default`].
pub const DEFAULT_PREFIX: &str = "LOKI_SHIPPER";

/// Event formatter producing `PREFIX | LEVEL | spans: message fields`.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    prefix: &'static str,
}

impl Formatter {
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{} | {} | ", self.prefix, event.metadata().level())?;
        write_scope(ctx, &mut writer)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Writes `outer{fields}: inner: ` for every span the event is inside of.
fn write_scope<S, N>(ctx: &FmtContext<'_, S, N>, writer: &mut format::Writer<'_>) -> fmt::Result
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let Some(scope) = ctx.event_scope() else {
        return Ok(());
    };

    for span in scope.from_root() {
        let extensions = span.extensions();
        match extensions
            .get::<FormattedFields<N>>()
            .filter(|fields| !fields.is_empty())
        {
            Some(fields) => write!(writer, "{}{{{}}}: ", span.name(), fields)?,
            None => write!(writer, "{}: ", span.name())?,
        }
    }
    Ok(())
}
