//! `deskctl`: maintenance commands for a desk store.
//!
//! # Usage
//!
//! ```text
//! deskctl --store ~/desk.db migrate
//! deskctl seed --customer 5f0c…
//! deskctl expire-subscriptions            # run daily from cron
//! deskctl renew 7d1e… --today 2024-01-20
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use desk_core::renewal::DEFAULT_RENEWAL_WINDOW_DAYS;
use desk_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "deskctl", about = "Maintenance commands for the desk store")]
struct Args {
  /// Path to the SQLite database.
  #[arg(long, env = "DESK_STORE_PATH", default_value = "desk.db")]
  store: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Bring the schema up to date and print its version.
  Migrate,

  /// Insert a sample subscription and ticket.
  Seed {
    /// Customer to seed for. A new id is generated when omitted.
    #[arg(long)]
    customer: Option<Uuid>,
  },

  /// Mark every active subscription past its end date as expired.
  ExpireSubscriptions {
    /// Evaluate as of this date instead of today (UTC).
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,
  },

  /// Renew a subscription by one billing period.
  Renew {
    subscription_id: Uuid,

    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Days before the end date at which renewal opens.
    #[arg(long, default_value_t = DEFAULT_RENEWAL_WINDOW_DAYS)]
    window_days: i64,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let store = SqliteStore::open(&args.store)
    .await
    .with_context(|| format!("opening store {}", args.store.display()))?;
  let today = |d: Option<NaiveDate>| d.unwrap_or_else(|| Utc::now().date_naive());

  match args.command {
    Command::Migrate => {
      let version = store.schema_version().await.context("reading schema version")?;
      println!("schema version {version}");
    }
    Command::Seed { customer } => {
      let customer_id = customer.unwrap_or_else(Uuid::new_v4);
      let seeded = commands::seed(&store, customer_id, today(None)).await?;
      println!("customer     {}", seeded.customer_id);
      println!("subscription {}", seeded.subscription_id);
      println!("ticket       {}", seeded.ticket_id);
    }
    Command::ExpireSubscriptions { today: on } => {
      let expired = commands::expire_subscriptions(&store, today(on)).await?;
      println!("expired {expired} subscription(s)");
    }
    Command::Renew { subscription_id, today: on, window_days } => {
      let renewal =
        commands::renew(&store, subscription_id, window_days, today(on)).await?;
      println!(
        "{}",
        serde_json::to_string_pretty(&renewal).context("encoding renewal")?
      );
    }
  }

  Ok(())
}
