//! Error types for `desk-core`.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification surfaced to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  ValidationFailed,
  PersistenceFailed,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotFound => "not_found",
      Self::ValidationFailed => "validation_failed",
      Self::PersistenceFailed => "persistence_failed",
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("ticket not found: {0}")]
  TicketNotFound(Uuid),

  #[error("subscription not found: {0}")]
  SubscriptionNotFound(Uuid),

  #[error("{0}")]
  Validation(String),

  #[error("Cannot reply to a closed ticket")]
  TicketClosed(Uuid),

  #[error("subscription {0} is not eligible for renewal")]
  NotEligible(Uuid),

  #[error("persistence failed: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  /// Wrap a backend error.
  pub fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::TicketNotFound(_) | Self::SubscriptionNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::Validation(_) | Self::TicketClosed(_) | Self::NotEligible(_) => {
        ErrorKind::ValidationFailed
      }
      Self::Persistence(_) => ErrorKind::PersistenceFailed,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closed_ticket_message_is_user_facing() {
    let err = Error::TicketClosed(Uuid::nil());
    assert_eq!(err.to_string(), "Cannot reply to a closed ticket");
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
  }

  #[test]
  fn kinds() {
    assert_eq!(Error::TicketNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
    assert_eq!(
      Error::persistence(std::io::Error::other("disk")).kind(),
      ErrorKind::PersistenceFailed
    );
  }
}
