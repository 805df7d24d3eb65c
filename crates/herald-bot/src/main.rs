//! herald bot binary.
//!
//! Reads `herald.toml` (or the path given with `--config`), opens the SQLite
//! store, and runs the requested action. A typical deployment runs
//! `herald run` from a timer; everything else is diagnostics and cleanup.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use herald_core::store::Table;

mod app;
mod fetch;
mod notify;
mod settings;

use app::App;
use settings::BotConfig;

#[derive(Parser)]
#[command(author, version, about = "Periodic fetch-store-notify bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "herald.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

/// Every action the bot can perform, declared statically.
#[derive(Subcommand)]
enum Command {
  /// Run one full bot cycle: reconcile, fetch, store, notify, sweep.
  Run {
    /// Skip notification for this cycle (records are still swept).
    #[arg(long)]
    no_notify: bool,
  },
  /// Print every row in every managed table.
  Rows,
  /// Print every stored record.
  Records,
  /// Drop the records table. A dry run unless --yes is given.
  DropRecords {
    #[arg(long)]
    yes: bool,
  },
  /// Drop the registry table. A dry run unless --yes is given.
  DropRegistry {
    #[arg(long)]
    yes: bool,
  },
  /// Drop all managed tables. A dry run unless --yes is given.
  DropAll {
    #[arg(long)]
    yes: bool,
  },
  /// Print version information.
  Info,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if let Command::Info = cli.command {
    println!("herald {}", env!("CARGO_PKG_VERSION"));
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config))
    .add_source(config::Environment::with_prefix("HERALD"))
    .build()
    .context("failed to read config file")?;

  let bot_cfg: BotConfig = settings
    .try_deserialize()
    .context("failed to deserialise BotConfig")?;

  let notify_default = bot_cfg.notify;
  let app = App::new(bot_cfg)?;

  match cli.command {
    Command::Run { no_notify } => app.run(notify_default && !no_notify)?,
    Command::Rows => app.print_all_rows()?,
    Command::Records => app.print_records()?,
    Command::DropRecords { yes } => app.drop_table(Table::Records, yes)?,
    Command::DropRegistry { yes } => app.drop_table(Table::Registry, yes)?,
    Command::DropAll { yes } => app.drop_all(yes)?,
    Command::Info => unreachable!("handled before config load"),
  }

  Ok(())
}
