//! Support tickets.
//!
//! A ticket is a customer's support request. Its status and priority are
//! closed enums; the string forms (`"WAITING_ON_CUSTOMER"`, `"HIGH"`) are what
//! travels over the wire and what the database stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound on subject length, in characters.
pub const SUBJECT_MAX_CHARS: usize = 255;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a ticket is in its life. Any status may move to any other.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantArray,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
  #[default]
  Open,
  InProgress,
  WaitingOnCustomer,
  Resolved,
  Closed,
}

impl TicketStatus {
  /// Parse a wire value, rejecting anything outside the five known statuses.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| {
      Error::validation(format!(
        "invalid ticket status {s:?}; expected one of {}",
        join_variants(Self::VARIANTS)
      ))
    })
  }
}

// ─── Priority ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantArray,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
  Low,
  #[default]
  Medium,
  High,
  Urgent,
}

impl TicketPriority {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| {
      Error::validation(format!(
        "invalid ticket priority {s:?}; expected one of {}",
        join_variants(Self::VARIANTS)
      ))
    })
  }
}

fn join_variants<T: AsRef<str>>(variants: &[T]) -> String {
  variants.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:       Uuid,
  pub customer_id:     Uuid,
  pub subscription_id: Option<Uuid>,
  pub subject:         String,
  pub category:        String,
  pub priority:        TicketPriority,
  pub status:          TicketStatus,
  pub assignee_id:     Option<Uuid>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Ticket {
  pub fn is_closed(&self) -> bool { self.status == TicketStatus::Closed }
}

// ─── NewTicket ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::TicketStore::create_ticket`].
///
/// Status and timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
  pub customer_id:     Uuid,
  #[serde(default)]
  pub subscription_id: Option<Uuid>,
  pub subject:         String,
  pub category:        String,
  #[serde(default)]
  pub priority:        TicketPriority,
  /// Opening message from the customer, stored as the first thread entry.
  #[serde(default)]
  pub message:         Option<String>,
}

impl NewTicket {
  pub fn new(
    customer_id: Uuid,
    subject: impl Into<String>,
    category: impl Into<String>,
  ) -> Self {
    Self {
      customer_id,
      subscription_id: None,
      subject: subject.into(),
      category: category.into(),
      priority: TicketPriority::default(),
      message: None,
    }
  }

  /// Trim text fields and check the required ones.
  pub fn validated(mut self) -> Result<Self> {
    self.subject = self.subject.trim().to_owned();
    self.category = self.category.trim().to_owned();

    if self.subject.is_empty() {
      return Err(Error::validation("subject is required"));
    }
    if self.subject.chars().count() > SUBJECT_MAX_CHARS {
      return Err(Error::validation(format!(
        "subject must be at most {SUBJECT_MAX_CHARS} characters"
      )));
    }
    if self.category.is_empty() {
      return Err(Error::validation("category is required"));
    }

    self.message = self
      .message
      .map(|m| m.trim().to_owned())
      .filter(|m| !m.is_empty());

    Ok(self)
  }
}

// ─── TicketPatch ─────────────────────────────────────────────────────────────

/// Partial update for [`crate::store::TicketStore::update_ticket`]. `None`
/// leaves a field untouched; `updated_at` is bumped regardless.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
  pub priority: Option<TicketPriority>,
  pub status:   Option<TicketStatus>,
  /// `Some(None)` clears the assignee.
  pub assignee: Option<Option<Uuid>>,
}

impl TicketPatch {
  pub fn status(status: TicketStatus) -> Self {
    Self { status: Some(status), ..Default::default() }
  }

  pub fn priority(priority: TicketPriority) -> Self {
    Self { priority: Some(priority), ..Default::default() }
  }

  pub fn assignee(assignee: Option<Uuid>) -> Self {
    Self { assignee: Some(assignee), ..Default::default() }
  }

  /// Only bump `updated_at`.
  pub fn touch() -> Self { Self::default() }
}
