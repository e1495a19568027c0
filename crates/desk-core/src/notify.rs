//! The notification collaborator.
//!
//! Delivery is best-effort: the ticket service logs a failed notification and
//! carries on. Only [`LogNotifier`] lives here; network transports live in
//! the server.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
  /// Tell a customer that a reply was posted on their ticket.
  fn notify(
    &self,
    customer_id: Uuid,
    ticket_id: Uuid,
    content: &str,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Emits a tracing event instead of contacting the customer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn notify(
    &self,
    customer_id: Uuid,
    ticket_id: Uuid,
    content: &str,
  ) -> Result<(), NotifyError> {
    info!(
      %customer_id,
      %ticket_id,
      chars = content.chars().count(),
      "reply notification (log only)"
    );
    Ok(())
  }
}

/// What happened to the notification attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotificationOutcome {
  Sent,
  /// Internal notes never notify.
  Skipped,
  /// The message was persisted but the customer was not told.
  Failed(String),
}
