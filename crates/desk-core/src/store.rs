//! Store traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `desk-store-sqlite`).
//! The services in this crate and the HTTP layer depend on these abstractions,
//! never on a concrete backend. A backend handle is constructed once and passed
//! in explicitly.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  message::{Message, NewMessage},
  subscription::{NewSubscription, Renewal, Subscription},
  ticket::{NewTicket, Ticket, TicketPatch, TicketPriority, TicketStatus},
};

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 25;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filters for [`TicketStore::list_tickets`] and
/// [`TicketStore::count_tickets`].
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
  pub customer_id: Option<Uuid>,
  pub status:      Option<TicketStatus>,
  pub priority:    Option<TicketPriority>,
  pub assignee_id: Option<Uuid>,
  pub category:    Option<String>,
  /// Free-text match against the subject or the ticket id.
  pub search:      Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl TicketQuery {
  pub fn for_customer(customer_id: Uuid) -> Self {
    Self { customer_id: Some(customer_id), ..Default::default() }
  }

  pub fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_PAGE_SIZE) }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Common base of every store trait: one backend, one error type.
///
/// All methods on the store traits return `Send` futures so a backend can be
/// shared across a multi-threaded runtime (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Persisted ticket records.
pub trait TicketStore: Store {
  /// Persist a new ticket with a generated id, status `OPEN` and
  /// `updated_at == created_at`.
  fn create_ticket(
    &self,
    input: NewTicket,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  /// Retrieve a ticket by id. Returns `None` if not found.
  fn get_ticket(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  /// Apply a partial update and bump `updated_at`. Returns `false` when no
  /// ticket has this id.
  fn update_ticket(
    &self,
    id: Uuid,
    patch: TicketPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Filtered, paginated listing; most recently updated first.
  fn list_tickets<'a>(
    &'a self,
    query: &'a TicketQuery,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + 'a;

  /// Number of tickets matching `query`, ignoring `limit` and `offset`.
  fn count_tickets<'a>(
    &'a self,
    query: &'a TicketQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

/// Ordered message threads, one per ticket.
pub trait MessageStore: Store {
  fn create_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages for a ticket, oldest first. With `include_internal == false`
  /// internal notes are excluded entirely.
  fn list_messages(
    &self,
    ticket_id: Uuid,
    include_internal: bool,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;
}

/// Subscriptions and their renewal history.
pub trait SubscriptionStore: Store {
  fn create_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  fn get_subscription(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// All subscriptions, or only those of one customer.
  fn list_subscriptions(
    &self,
    customer_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// Move the subscription from `renewal.previous_end_date` to
  /// `renewal.new_end_date`, set it `ACTIVE` and record `renewal`, all in one
  /// transaction. Returns `false` and writes nothing when the subscription is
  /// missing, cancelled, or no longer ends on `previous_end_date`.
  fn apply_renewal(
    &self,
    renewal: Renewal,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Renewals applied to a subscription, oldest first.
  fn list_renewals(
    &self,
    subscription_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Renewal>, Self::Error>> + Send + '_;

  /// Mark every `ACTIVE` subscription with `end_date < today` as `EXPIRED`.
  /// Returns how many rows changed.
  fn expire_lapsed(
    &self,
    today: NaiveDate,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
