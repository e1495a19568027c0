//! Ticket thread messages.
//!
//! Messages are immutable once written. Internal notes are staff-only and are
//! filtered out of every customer-facing read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorType {
  Customer,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub message_id:  Uuid,
  pub ticket_id:   Uuid,
  pub author_id:   Uuid,
  pub author_type: AuthorType,
  pub content:     String,
  pub is_internal: bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::MessageStore::create_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub ticket_id:   Uuid,
  pub author_id:   Uuid,
  pub author_type: AuthorType,
  pub content:     String,
  pub is_internal: bool,
}

impl NewMessage {
  pub fn from_customer(
    ticket_id: Uuid,
    customer_id: Uuid,
    content: impl Into<String>,
  ) -> Self {
    Self {
      ticket_id,
      author_id: customer_id,
      author_type: AuthorType::Customer,
      content: content.into(),
      is_internal: false,
    }
  }

  pub fn from_admin(
    ticket_id: Uuid,
    admin_id: Uuid,
    content: impl Into<String>,
    is_internal: bool,
  ) -> Self {
    Self {
      ticket_id,
      author_id: admin_id,
      author_type: AuthorType::Admin,
      content: content.into(),
      is_internal,
    }
  }
}

/// Who is reading a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
  /// Staff see everything, internal notes included.
  Staff,
  /// A customer sees only their own tickets and only public messages.
  Customer(Uuid),
}

impl Audience {
  pub fn includes_internal(self) -> bool { matches!(self, Self::Staff) }
}
