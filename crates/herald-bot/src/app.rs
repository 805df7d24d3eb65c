//! Bot actions, wired together in the fixed run order.

use anyhow::Context as _;

use herald_core::store::{Store, Table};
use herald_store_sqlite::SqliteStore;

use crate::{fetch::Fetcher, notify::Notifier, settings::BotConfig};

pub struct App {
  config: BotConfig,
  store:  SqliteStore,
}

impl App {
  pub fn new(config: BotConfig) -> anyhow::Result<Self> {
    let extra = config
      .record_fields
      .iter()
      .map(|field| field.to_column())
      .collect::<Result<Vec<_>, _>>()
      .context("invalid record_fields configuration")?;

    let store = SqliteStore::open(&config.store_path, extra)
      .with_context(|| format!("failed to open store at {:?}", config.store_path))?;

    Ok(Self { config, store })
  }

  /// One full bot cycle: ensure schema → reconcile registry → fetch and
  /// ingest per source → read new records → notify → sweep old.
  ///
  /// Any error aborts the cycle before the sweep, so undelivered records
  /// stay new and are picked up by the next run.
  pub fn run(&self, notify: bool) -> anyhow::Result<()> {
    self.store.ensure_schema()?;
    self.store.reconcile_registry(&self.config.sources)?;

    let fetcher = Fetcher::new()?;
    for source in &self.config.sources {
      let records = fetcher
        .fetch(source, &self.config.record_fields, self.config.max_records)
        .with_context(|| format!("fetch failed for source `{}`", source.name))?;
      tracing::info!(source = %source.name, count = records.len(), "fetched");
      self.store.ingest(&records, source)?;
    }

    let new_records = self.store.fetch_new()?;
    tracing::info!(count = new_records.len(), "new records");

    if notify && !new_records.is_empty() {
      let notifier = Notifier::from_recipients_file(&self.config.recipients_path)
        .with_context(|| {
          format!("failed to load recipients from {:?}", self.config.recipients_path)
        })?;
      tracing::info!(recipients = notifier.recipient_count(), "notifying");
      notifier.notify(&new_records)?;
    }

    self.store.sweep_old()?;
    Ok(())
  }

  pub fn print_all_rows(&self) -> anyhow::Result<()> {
    for (table, rows) in self.store.fetch_all_rows()? {
      println!("── {table} ──");
      print_rows(&rows);
    }
    Ok(())
  }

  pub fn print_records(&self) -> anyhow::Result<()> {
    let rows = self.store.fetch_table_rows(Table::Records)?;
    if rows.is_empty() {
      println!("No records found");
      return Ok(());
    }
    print_rows(&rows);
    Ok(())
  }

  pub fn drop_table(&self, table: Table, perform: bool) -> anyhow::Result<()> {
    self.store.drop_table(table, perform)?;
    Ok(())
  }

  pub fn drop_all(&self, perform: bool) -> anyhow::Result<()> {
    self.store.drop_all(perform)?;
    Ok(())
  }
}

fn print_rows(rows: &[herald_core::record::Record]) {
  let Some(first) = rows.first() else {
    println!("(empty)");
    return;
  };

  let header: Vec<&str> = first.iter().map(|(name, _)| name).collect();
  println!("{}", header.join(" | "));
  for row in rows {
    let values: Vec<String> = row.iter().map(|(_, value)| value.to_string()).collect();
    println!("{}", values.join(" | "));
  }
}
