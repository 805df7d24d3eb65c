//! Webhook notification of new records.
//!
//! The notifier receives exactly the sequence the store's `fetch_new`
//! returned and delivers it to every recipient listed in an external JSON
//! file. It reports nothing back to the store; the caller decides whether a
//! failed delivery aborts the run.

use std::path::Path;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use herald_core::record::Record;

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("failed to read recipients file: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed recipients file: {0}")]
  Json(#[from] serde_json::Error),

  #[error("delivery failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("delivery failed with status {status}: {endpoint}")]
  Status {
    status:   reqwest::StatusCode,
    endpoint: String,
  },
}

/// One notification recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
  pub endpoint: String,
}

/// Wire shape of a delivery. Serialised directly so each record keeps its
/// column order on the wire.
#[derive(Serialize)]
struct Payload<'a> {
  items: &'a [Record],
}

pub struct Notifier {
  client:     Client,
  recipients: Vec<Recipient>,
}

impl Notifier {
  /// Read the recipient list from a JSON array of `{ "endpoint": ... }`.
  pub fn from_recipients_file(path: &Path) -> Result<Self, NotifyError> {
    let raw = std::fs::read_to_string(path)?;
    let recipients: Vec<Recipient> = serde_json::from_str(&raw)?;
    Ok(Self { client: Client::new(), recipients })
  }

  /// Deliver `records` to every recipient, failing on the first error so
  /// the caller never sweeps records that were not delivered.
  pub fn notify(&self, records: &[Record]) -> Result<(), NotifyError> {
    let payload = Payload { items: records };

    for recipient in &self.recipients {
      let response = self.client.post(&recipient.endpoint).json(&payload).send()?;
      let status = response.status();
      if !status.is_success() {
        return Err(NotifyError::Status {
          status,
          endpoint: recipient.endpoint.clone(),
        });
      }
      tracing::info!(endpoint = %recipient.endpoint, "notification delivered");
    }
    Ok(())
  }

  pub fn recipient_count(&self) -> usize {
    self.recipients.len()
  }
}
