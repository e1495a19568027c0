//! JSON REST API for desk.
//!
//! Exposes two axum [`Router`]s over the ticket and renewal services: one for
//! staff and one for the customer portal. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = desk_api::ApiState::new(store, notifier, 30);
//! Router::new()
//!   .nest("/api/admin", desk_api::admin_router(state.clone()))
//!   .nest("/api/portal", desk_api::portal_router(state))
//! ```

pub mod error;
pub mod extract;
pub mod portal;
pub mod subscriptions;
pub mod tickets;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use desk_core::{
  Error, RenewalService, TicketService,
  notify::Notifier,
  store::{MessageStore, SubscriptionStore, TicketQuery, TicketStore},
  ticket::{TicketPriority, TicketStatus},
};
use serde::Deserialize;
use uuid::Uuid;

pub use error::ApiError;

/// Largest page a listing will return, whatever `limit` asks for.
pub const MAX_PAGE_SIZE: usize = 100;

/// Everything a backend must provide to serve the API.
pub trait DeskStore:
  TicketStore + MessageStore + SubscriptionStore + Clone + 'static
{
}

impl<T> DeskStore for T where
  T: TicketStore + MessageStore + SubscriptionStore + Clone + 'static
{
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, N> {
  pub tickets:  Arc<TicketService<S, N>>,
  pub renewals: Arc<RenewalService<S>>,
}

impl<S, N> Clone for ApiState<S, N> {
  fn clone(&self) -> Self {
    Self {
      tickets:  self.tickets.clone(),
      renewals: self.renewals.clone(),
    }
  }
}

impl<S: DeskStore, N: Notifier> ApiState<S, N> {
  pub fn new(store: S, notifier: N, renewal_window_days: i64) -> Self {
    Self {
      renewals: Arc::new(
        RenewalService::new(store.clone()).with_window_days(renewal_window_days),
      ),
      tickets:  Arc::new(TicketService::new(store, notifier)),
    }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Staff endpoints. Mount behind authentication.
pub fn admin_router<S, N>(state: ApiState<S, N>) -> Router<()>
where
  S: DeskStore,
  N: Notifier + 'static,
{
  Router::new()
    // Tickets
    .route("/tickets", get(tickets::list::<S, N>))
    .route("/tickets/{id}", get(tickets::get_one::<S, N>))
    .route("/tickets/{id}/status", put(tickets::update_status::<S, N>))
    .route("/tickets/{id}/priority", put(tickets::update_priority::<S, N>))
    .route("/tickets/{id}/assignee", put(tickets::update_assignee::<S, N>))
    .route("/tickets/{id}/replies", post(tickets::reply::<S, N>))
    // Subscriptions
    .route("/subscriptions/expire", post(subscriptions::expire::<S, N>))
    .route("/subscriptions/{id}/renewals", get(subscriptions::history::<S, N>))
    .route("/subscriptions/{id}/renew", post(subscriptions::renew::<S, N>))
    .with_state(state)
}

/// Customer endpoints. The customer is identified by the path.
pub fn portal_router<S, N>(state: ApiState<S, N>) -> Router<()>
where
  S: DeskStore,
  N: Notifier + 'static,
{
  Router::new()
    .route(
      "/customers/{customer_id}/tickets",
      get(portal::list_tickets::<S, N>).post(portal::create_ticket::<S, N>),
    )
    .route(
      "/customers/{customer_id}/tickets/{id}",
      get(portal::get_ticket::<S, N>),
    )
    .route(
      "/customers/{customer_id}/tickets/{id}/replies",
      post(portal::reply::<S, N>),
    )
    .route(
      "/customers/{customer_id}/subscriptions",
      get(portal::list_subscriptions::<S, N>),
    )
    .route(
      "/customers/{customer_id}/subscriptions/{id}/renewal",
      get(portal::renewal_quote::<S, N>).post(portal::renew::<S, N>),
    )
    .with_state(state)
}

// ─── Shared query params ─────────────────────────────────────────────────────

/// Query string accepted by ticket listings. Empty values are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub customer_id: Option<String>,
  pub status:      Option<String>,
  pub priority:    Option<String>,
  pub assignee_id: Option<String>,
  pub category:    Option<String>,
  /// Free text matched against the subject or the ticket id.
  pub q:           Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl ListParams {
  pub fn into_query(self) -> Result<TicketQuery, ApiError> {
    Ok(TicketQuery {
      customer_id: non_empty_uuid("customer_id", self.customer_id)?,
      status:      non_empty(self.status)
        .map(|s| TicketStatus::parse(&s))
        .transpose()?,
      priority:    non_empty(self.priority)
        .map(|p| TicketPriority::parse(&p))
        .transpose()?,
      assignee_id: non_empty_uuid("assignee_id", self.assignee_id)?,
      category:    non_empty(self.category),
      search:      non_empty(self.q),
      limit:       self.limit.map(|l| l.min(MAX_PAGE_SIZE)),
      offset:      self.offset,
    })
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

fn non_empty_uuid(field: &str, value: Option<String>) -> Result<Option<Uuid>, Error> {
  non_empty(value)
    .map(|v| {
      Uuid::parse_str(&v)
        .map_err(|_| Error::validation(format!("invalid {field}: {v}")))
    })
    .transpose()
}

#[cfg(test)]
mod tests;
