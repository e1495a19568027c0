//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings with microsecond precision,
//! so lexical order equals chronological order. Dates are `YYYY-MM-DD`. Enums
//! are stored in their wire form. UUIDs are hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use desk_core::{
  message::Message,
  subscription::{Renewal, Subscription},
  ticket::Ticket,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time at the precision the store keeps, so values handed back
/// to callers equal what a later read returns.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownEnum { column, value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const TICKET_COLUMNS: &str = "ticket_id, customer_id, subscription_id, \
  subject, category, priority, status, assignee_id, created_at, updated_at";

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:       String,
  pub customer_id:     String,
  pub subscription_id: Option<String>,
  pub subject:         String,
  pub category:        String,
  pub priority:        String,
  pub status:          String,
  pub assignee_id:     Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawTicket {
  /// Read a row selected with [`TICKET_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:       row.get(0)?,
      customer_id:     row.get(1)?,
      subscription_id: row.get(2)?,
      subject:         row.get(3)?,
      category:        row.get(4)?,
      priority:        row.get(5)?,
      status:          row.get(6)?,
      assignee_id:     row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
    })
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:       decode_uuid(&self.ticket_id)?,
      customer_id:     decode_uuid(&self.customer_id)?,
      subscription_id: decode_opt_uuid(self.subscription_id)?,
      subject:         self.subject,
      category:        self.category,
      priority:        decode_enum("priority", &self.priority)?,
      status:          decode_enum("status", &self.status)?,
      assignee_id:     decode_opt_uuid(self.assignee_id)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "message_id, ticket_id, author_id, author_type, content, is_internal, created_at";

/// Raw values read directly from a `ticket_messages` row.
pub struct RawMessage {
  pub message_id:  String,
  pub ticket_id:   String,
  pub author_id:   String,
  pub author_type: String,
  pub content:     String,
  pub is_internal: bool,
  pub created_at:  String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:  row.get(0)?,
      ticket_id:   row.get(1)?,
      author_id:   row.get(2)?,
      author_type: row.get(3)?,
      content:     row.get(4)?,
      is_internal: row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:  decode_uuid(&self.message_id)?,
      ticket_id:   decode_uuid(&self.ticket_id)?,
      author_id:   decode_uuid(&self.author_id)?,
      author_type: decode_enum("author_type", &self.author_type)?,
      content:     self.content,
      is_internal: self.is_internal,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, customer_id, plan_name, \
  billing_period_months, mrp_cents, discounted_price_cents, start_date, \
  end_date, status, created_at, updated_at";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:        String,
  pub customer_id:            String,
  pub plan_name:              String,
  pub billing_period_months:  i64,
  pub mrp_cents:              i64,
  pub discounted_price_cents: Option<i64>,
  pub start_date:             String,
  pub end_date:               String,
  pub status:                 String,
  pub created_at:             String,
  pub updated_at:             String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:        row.get(0)?,
      customer_id:            row.get(1)?,
      plan_name:              row.get(2)?,
      billing_period_months:  row.get(3)?,
      mrp_cents:              row.get(4)?,
      discounted_price_cents: row.get(5)?,
      start_date:             row.get(6)?,
      end_date:               row.get(7)?,
      status:                 row.get(8)?,
      created_at:             row.get(9)?,
      updated_at:             row.get(10)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:        decode_uuid(&self.subscription_id)?,
      customer_id:            decode_uuid(&self.customer_id)?,
      plan_name:              self.plan_name,
      billing_period_months:  u32::try_from(self.billing_period_months)
        .map_err(|_| Error::OutOfRange("billing_period_months"))?,
      mrp_cents:              self.mrp_cents,
      discounted_price_cents: self.discounted_price_cents,
      start_date:             decode_date(&self.start_date)?,
      end_date:               decode_date(&self.end_date)?,
      status:                 decode_enum("status", &self.status)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}

pub const RENEWAL_COLUMNS: &str = "renewal_id, subscription_id, \
  previous_end_date, new_end_date, amount_cents, renewed_at";

/// Raw values read directly from a `subscription_renewals` row.
pub struct RawRenewal {
  pub renewal_id:        String,
  pub subscription_id:   String,
  pub previous_end_date: String,
  pub new_end_date:      String,
  pub amount_cents:      i64,
  pub renewed_at:        String,
}

impl RawRenewal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      renewal_id:        row.get(0)?,
      subscription_id:   row.get(1)?,
      previous_end_date: row.get(2)?,
      new_end_date:      row.get(3)?,
      amount_cents:      row.get(4)?,
      renewed_at:        row.get(5)?,
    })
  }

  pub fn into_renewal(self) -> Result<Renewal> {
    Ok(Renewal {
      renewal_id:        decode_uuid(&self.renewal_id)?,
      subscription_id:   decode_uuid(&self.subscription_id)?,
      previous_end_date: decode_date(&self.previous_end_date)?,
      new_end_date:      decode_date(&self.new_end_date)?,
      amount_cents:      self.amount_cents,
      renewed_at:        decode_dt(&self.renewed_at)?,
    })
  }
}
