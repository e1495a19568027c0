//! [`SqliteStore`], the SQLite implementation of the desk store traits.

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};
use tracing::info;
use uuid::Uuid;

use desk_core::{
  message::{Message, NewMessage},
  store::{MessageStore, Store, TicketQuery, TicketStore},
  ticket::{NewTicket, Ticket, TicketPatch, TicketStatus},
};

use crate::{
  Result,
  encode::{
    MESSAGE_COLUMNS, RawMessage, RawTicket, TICKET_COLUMNS, encode_dt, encode_uuid,
    now,
  },
  schema::{LATEST_VERSION, MIGRATIONS, PRAGMAS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A desk store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Apply every migration the database has not seen yet. Returns how many
  /// ran; zero means the schema was already current.
  pub async fn migrate(&self) -> Result<u32> {
    let (from, to) = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        let from: u32 =
          conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

        for (idx, sql) in MIGRATIONS.iter().enumerate().skip(from as usize) {
          let tx = conn.transaction()?;
          tx.execute_batch(sql)?;
          tx.pragma_update(None, "user_version", idx as u32 + 1)?;
          tx.commit()?;
        }
        Ok((from, LATEST_VERSION.max(from)))
      })
      .await?;

    if to > from {
      info!(from, to, "applied schema migrations");
    }
    Ok(to - from)
  }

  /// The `user_version` currently recorded in the database.
  pub async fn schema_version(&self) -> Result<u32> {
    let version: u32 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;
    Ok(version)
  }
}

// ─── Query building ──────────────────────────────────────────────────────────

/// `WHERE` clause and positional arguments for a [`TicketQuery`].
fn ticket_filter(query: &TicketQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut args: Vec<Value> = vec![];

  if let Some(customer_id) = query.customer_id {
    conds.push("customer_id = ?");
    args.push(Value::Text(encode_uuid(customer_id)));
  }
  if let Some(status) = query.status {
    conds.push("status = ?");
    args.push(Value::Text(status.as_ref().to_owned()));
  }
  if let Some(priority) = query.priority {
    conds.push("priority = ?");
    args.push(Value::Text(priority.as_ref().to_owned()));
  }
  if let Some(assignee_id) = query.assignee_id {
    conds.push("assignee_id = ?");
    args.push(Value::Text(encode_uuid(assignee_id)));
  }
  if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
    conds.push("category = ?");
    args.push(Value::Text(category.to_owned()));
  }
  if let Some(text) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let pattern = format!("%{}%", escape_like(text));
    conds.push(r"(subject LIKE ? ESCAPE '\' OR ticket_id LIKE ? ESCAPE '\')");
    args.push(Value::Text(pattern.clone()));
    args.push(Value::Text(pattern));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, args)
}

/// Escape `text` so `%` and `_` match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Store impls ─────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = crate::Error;
}

impl TicketStore for SqliteStore {
  async fn create_ticket(&self, input: NewTicket) -> Result<Ticket> {
    let created_at = now();
    let ticket = Ticket {
      ticket_id: Uuid::new_v4(),
      customer_id: input.customer_id,
      subscription_id: input.subscription_id,
      subject: input.subject,
      category: input.category,
      priority: input.priority,
      status: TicketStatus::Open,
      assignee_id: None,
      created_at,
      updated_at: created_at,
    };

    let id_str       = encode_uuid(ticket.ticket_id);
    let customer_str = encode_uuid(ticket.customer_id);
    let sub_str      = ticket.subscription_id.map(encode_uuid);
    let subject      = ticket.subject.clone();
    let category     = ticket.category.clone();
    let priority_str = ticket.priority.as_ref().to_owned();
    let status_str   = ticket.status.as_ref().to_owned();
    let at_str       = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tickets (
             ticket_id, customer_id, subscription_id, subject, category,
             priority, status, assignee_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
          rusqlite::params![
            id_str,
            customer_str,
            sub_str,
            subject,
            category,
            priority_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(ticket)
  }

  async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTicket> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
              rusqlite::params![id_str],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTicket::into_ticket).transpose()
  }

  async fn update_ticket(&self, id: Uuid, patch: TicketPatch) -> Result<bool> {
    let mut sets: Vec<&'static str> = vec!["updated_at = ?"];
    let mut args: Vec<Value> = vec![Value::Text(encode_dt(now()))];

    if let Some(priority) = patch.priority {
      sets.push("priority = ?");
      args.push(Value::Text(priority.as_ref().to_owned()));
    }
    if let Some(status) = patch.status {
      sets.push("status = ?");
      args.push(Value::Text(status.as_ref().to_owned()));
    }
    if let Some(assignee) = patch.assignee {
      sets.push("assignee_id = ?");
      args.push(assignee.map_or(Value::Null, |a| Value::Text(encode_uuid(a))));
    }
    args.push(Value::Text(encode_uuid(id)));

    let sql = format!("UPDATE tickets SET {} WHERE ticket_id = ?", sets.join(", "));

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&sql, rusqlite::params_from_iter(args))?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
    let (where_clause, mut args) = ticket_filter(query);
    args.push(Value::Integer(i64::try_from(query.limit()).unwrap_or(i64::MAX)));
    args.push(Value::Integer(i64::try_from(query.offset()).unwrap_or(i64::MAX)));

    let sql = format!(
      "SELECT {TICKET_COLUMNS}
       FROM tickets
       {where_clause}
       ORDER BY updated_at DESC, created_at DESC, ticket_id ASC
       LIMIT ? OFFSET ?"
    );

    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawTicket::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }

  async fn count_tickets(&self, query: &TicketQuery) -> Result<u64> {
    let (where_clause, args) = ticket_filter(query);
    let sql = format!("SELECT COUNT(*) FROM tickets {where_clause}");

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(args), |r| r.get(0))?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }
}

impl MessageStore for SqliteStore {
  async fn create_message(&self, input: NewMessage) -> Result<Message> {
    let message = Message {
      message_id:  Uuid::new_v4(),
      ticket_id:   input.ticket_id,
      author_id:   input.author_id,
      author_type: input.author_type,
      content:     input.content,
      is_internal: input.is_internal,
      created_at:  now(),
    };

    let id_str     = encode_uuid(message.message_id);
    let ticket_str = encode_uuid(message.ticket_id);
    let author_str = encode_uuid(message.author_id);
    let type_str   = message.author_type.as_ref().to_owned();
    let content    = message.content.clone();
    let internal   = message.is_internal;
    let at_str     = encode_dt(message.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ticket_messages (
             message_id, ticket_id, author_id, author_type, content,
             is_internal, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, ticket_str, author_str, type_str, content, internal, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(message)
  }

  async fn list_messages(
    &self,
    ticket_id:        Uuid,
    include_internal: bool,
  ) -> Result<Vec<Message>> {
    let ticket_str = encode_uuid(ticket_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS}
           FROM ticket_messages
           WHERE ticket_id = ?1
             AND (?2 OR is_internal = 0)
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![ticket_str, include_internal],
            RawMessage::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}
