//! Cursor-driven sweep over the events endpoint.
use crate::config::Config;
use crate::sink::Check;
use crate::time_range::TimeRange;
use crate::transport::Transport;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};
use url::Url;

/// Query of a single page request. The cursor is left out of the query string entirely when
/// absent.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub limit: NonZeroU32,
    pub range: &'a TimeRange,
    pub cursor: Option<&'a str>,
}

impl<'a> PageQuery<'a> {
    pub fn first(limit: NonZeroU32, range: &'a TimeRange) -> Self {
        Self {
            limit,
            range,
            cursor: None,
        }
    }

    pub fn after(self, cursor: &'a str) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }

    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("limit", &self.limit.to_string())
                .append_pair("time_from", &self.range.from)
                .append_pair("time_to", &self.range.to);
            if let Some(cursor) = self.cursor {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }
}

/// The part of a page body the traversal looks at. Items are never inspected.
///
/// Both fields are kept loosely typed and judged by truthiness, so `has_more: 1` continues and
/// `next_cursor: 0` stops.
#[derive(Debug, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub has_more: Value,
    #[serde(default)]
    pub next_cursor: Value,
}

impl PageResponse {
    /// Cursor to continue with, if the server says there is more and handed one out.
    pub fn into_next_cursor(self) -> Option<String> {
        if !truthy(&self.has_more) || !truthy(&self.next_cursor) {
            return None;
        }

        match self.next_cursor {
            Value::String(cursor) => Some(cursor),
            other => Some(other.to_string()),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0. && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Where the next page starts, or `None` when the flow is over. An absent or unparseable body
/// ends the flow the same way `has_more: false` does, and so does any JSON that is not an
/// object.
pub fn next_cursor(body: Option<&[u8]>) -> Option<String> {
    let body = body?;
    let value = match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(err) => {
            trace!("Unparseable page body: {err}");
            return None;
        }
    };

    if !value.is_object() {
        return None;
    }

    serde_json::from_value::<PageResponse>(value)
        .ok()?
        .into_next_cursor()
}

/// Outcome of one complete sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowResult {
    /// Sum of every page's request duration, in milliseconds.
    pub total_ms: f64,
    pub pages: u32,
}

impl FlowResult {
    pub fn page_avg_ms(&self) -> f64 {
        self.total_ms / self.pages as f64
    }
}

/// Fetch pages of `range` one after another, following `next_cursor`, until the server reports
/// no more pages or `config.max_pages` requests were issued.
///
/// Nothing here fails: every page is counted, its status goes to `status_check`, and a
/// missing or malformed body simply ends the sweep. Status and termination are independent, so
/// a non-200 answer carrying `has_more: true` keeps paginating.
#[instrument(name = "flow", skip_all, fields(from = %range.from, to = %range.to))]
pub async fn traverse<C>(
    client: &C,
    status_check: &Check,
    range: &TimeRange,
    config: &Config,
) -> FlowResult
where
    C: Transport,
{
    let mut cursor: Option<String> = None;
    let mut result = FlowResult::default();

    while result.pages < config.max_pages.get() {
        let mut query = PageQuery::first(config.limit, range);
        if let Some(cursor) = cursor.as_deref() {
            query = query.after(cursor);
        }

        let exchange = client.get(query.to_url(config.events_url())).await;
        result.total_ms += exchange.duration_ms();
        result.pages += 1;

        status_check.record(exchange.status == Some(StatusCode::OK));
        trace!(
            page = result.pages,
            status = ?exchange.status,
            "Page took {:.2}ms",
            exchange.duration_ms()
        );

        match next_cursor(exchange.body.as_deref()) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    if result.pages == config.max_pages.get() && cursor.is_some() {
        debug!("Stopped at the page cap of {}", config.max_pages);
    }

    result
}
