//! Customer portal handlers, all under `/customers/{customer_id}`.
//!
//! A ticket or subscription that belongs to another customer is reported as
//! not found. Internal notes never leave this module.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use desk_core::{
  message::Audience,
  notify::Notifier,
  service::{TicketPage, TicketThread},
  subscription::Subscription,
  ticket::{NewTicket, TicketPriority},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  ApiState, DeskStore, ListParams,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Tickets ─────────────────────────────────────────────────────────────────

/// `GET /customers/{customer_id}/tickets`
pub async fn list_tickets<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(customer_id): ApiPath<Uuid>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<TicketPage>, ApiError> {
  let query = params.into_query()?;
  Ok(Json(
    state.tickets.list_customer_tickets(customer_id, query).await?,
  ))
}

#[derive(Debug, Deserialize)]
pub struct NewTicketBody {
  pub subject:         String,
  pub category:        String,
  #[serde(default)]
  pub priority:        Option<String>,
  #[serde(default)]
  pub subscription_id: Option<Uuid>,
  /// Opening message, stored as the first entry of the thread.
  #[serde(default)]
  pub message:         Option<String>,
}

/// `POST /customers/{customer_id}/tickets`. Returns 201 + the new ticket.
pub async fn create_ticket<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(customer_id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<NewTicketBody>,
) -> Result<impl IntoResponse, ApiError> {
  if let Some(subscription_id) = body.subscription_id {
    state
      .renewals
      .get_subscription(subscription_id, Some(customer_id))
      .await?;
  }

  let priority = match body.priority.as_deref().map(str::trim) {
    None | Some("") => TicketPriority::default(),
    Some(p) => TicketPriority::parse(p)?,
  };

  let mut input = NewTicket::new(customer_id, body.subject, body.category);
  input.priority = priority;
  input.subscription_id = body.subscription_id;
  input.message = body.message;

  let ticket = state.tickets.create_ticket(input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "ticket": ticket })),
  ))
}

/// `GET /customers/{customer_id}/tickets/{id}`
pub async fn get_ticket<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath((customer_id, id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<TicketThread>, ApiError> {
  Ok(Json(
    state
      .tickets
      .thread(id, Audience::Customer(customer_id))
      .await?,
  ))
}

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
  pub content: String,
}

/// `POST /customers/{customer_id}/tickets/{id}/replies`
pub async fn reply<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath((customer_id, id)): ApiPath<(Uuid, Uuid)>,
  ApiJson(body): ApiJson<ReplyBody>,
) -> Result<impl IntoResponse, ApiError> {
  let message = state
    .tickets
    .add_customer_reply(id, customer_id, &body.content)
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "message": message })),
  ))
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

/// `GET /customers/{customer_id}/subscriptions`
pub async fn list_subscriptions<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(customer_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
  Ok(Json(
    state.renewals.list_customer_subscriptions(customer_id).await?,
  ))
}

/// `GET /customers/{customer_id}/subscriptions/{id}/renewal`: whether the
/// subscription can be renewed today, and what renewing would cost.
pub async fn renewal_quote<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath((customer_id, id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
  let subscription = state
    .renewals
    .get_subscription(id, Some(customer_id))
    .await?;
  let today = Utc::now().date_naive();
  let eligible = state.renewals.is_eligible_for_renewal(&subscription, today);
  let quote = state.renewals.quote(&subscription)?;

  Ok(Json(json!({
    "subscription": subscription,
    "eligible":     eligible,
    "quote":        quote,
  })))
}

/// `POST /customers/{customer_id}/subscriptions/{id}/renewal`
pub async fn renew<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath((customer_id, id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
  let today = Utc::now().date_naive();
  let renewal = state.renewals.renew(id, Some(customer_id), today).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "renewal": renewal })),
  ))
}
