//! HTTP fetching and record parsing.
//!
//! A source's endpoint is expected to serve a JSON array of objects; each
//! object is mapped onto the configured record columns. Parsing stays here —
//! the storage engine only ever sees finished records.

use reqwest::{
  blocking::Client,
  header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use thiserror::Error;

use herald_core::record::{Record, Source, Value};

use crate::settings::RecordField;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("request failed with status {status}: {url}")]
  Status {
    status: reqwest::StatusCode,
    url:    String,
  },
}

pub struct Fetcher {
  client: Client,
}

impl Fetcher {
  pub fn new() -> Result<Self, FetchError> {
    // Some feeds refuse requests without browser-looking headers.
    let mut headers = HeaderMap::new();
    headers.insert(
      USER_AGENT,
      HeaderValue::from_static(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0",
      ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.7"));

    let client = Client::builder().default_headers(headers).build()?;
    Ok(Self { client })
  }

  /// Fetch `source`'s endpoint and parse at most `max_records` records.
  /// Non-2xx responses are errors; there is no retry.
  pub fn fetch(
    &self,
    source: &Source,
    fields: &[RecordField],
    max_records: usize,
  ) -> Result<Vec<Record>, FetchError> {
    let response = self.client.get(&source.url).send()?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { status, url: source.url.clone() });
    }

    let items: Vec<serde_json::Map<String, serde_json::Value>> = response.json()?;
    Ok(
      items
        .iter()
        .take(max_records)
        .map(|item| record_from_json(item, fields))
        .collect(),
    )
  }
}

/// Map a JSON object onto the configured record columns. Unknown keys are
/// ignored; missing or mistyped values become NULL and are left for the
/// schema's nullability rules to accept or reject.
fn record_from_json(
  item: &serde_json::Map<String, serde_json::Value>,
  fields: &[RecordField],
) -> Record {
  let mut record = Record::new();
  for field in fields {
    let value = match item.get(&field.name) {
      Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
      Some(serde_json::Value::Number(n)) => {
        n.as_i64().map(Value::Integer).unwrap_or(Value::Null)
      }
      Some(serde_json::Value::Bool(b)) => Value::Bool(*b),
      _ => Value::Null,
    };
    record.set(field.name.as_str(), value);
  }
  record
}
