//! Integration tests for `SqliteStore` and the services on top of it, against
//! an in-memory database.

mod messages;

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use desk_core::notify::{Notifier, NotifyError};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Records every notification it is asked to send.
#[derive(Clone, Default)]
struct RecordingNotifier {
  sent: Arc<Mutex<Vec<(Uuid, Uuid, String)>>>,
}

impl RecordingNotifier {
  fn sent(&self) -> Vec<(Uuid, Uuid, String)> { self.sent.lock().unwrap().clone() }
}

impl Notifier for RecordingNotifier {
  async fn notify(
    &self,
    customer_id: Uuid,
    ticket_id: Uuid,
    content: &str,
  ) -> Result<(), NotifyError> {
    self
      .sent
      .lock()
      .unwrap()
      .push((customer_id, ticket_id, content.to_owned()));
    Ok(())
  }
}

/// Always fails, like a mail relay that is down.
struct FailingNotifier;

impl Notifier for FailingNotifier {
  async fn notify(&self, _: Uuid, _: Uuid, _: &str) -> Result<(), NotifyError> {
    Err(NotifyError("smtp relay unreachable".into()))
  }
}
