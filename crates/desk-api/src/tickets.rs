//! Staff handlers for `/tickets` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tickets` | Filters: [`ListParams`]; returns a [`TicketPage`] |
//! | `GET`  | `/tickets/{id}` | Ticket plus full thread, internal notes included |
//! | `PUT`  | `/tickets/{id}/status` | Body: `{"status":"RESOLVED"}` |
//! | `PUT`  | `/tickets/{id}/priority` | Body: `{"priority":"HIGH"}` |
//! | `PUT`  | `/tickets/{id}/assignee` | Body: `{"assignee_id":"<uuid>"}`; `""` or `null` unassigns |
//! | `POST` | `/tickets/{id}/replies` | Body: [`ReplyBody`]; returns 201 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use desk_core::{
  Error,
  message::Audience,
  notify::Notifier,
  service::{TicketPage, TicketThread},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  ApiState, DeskStore, ListParams,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /tickets[?status=...][&priority=...][&q=...][&limit=...][&offset=...]`
pub async fn list<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<TicketPage>, ApiError> {
  let query = params.into_query()?;
  Ok(Json(state.tickets.list_tickets(&query).await?))
}

/// `GET /tickets/{id}`
pub async fn get_one<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TicketThread>, ApiError> {
  Ok(Json(state.tickets.thread(id, Audience::Staff).await?))
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /tickets/{id}/status`
pub async fn update_status<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<StatusBody>,
) -> Result<impl IntoResponse, ApiError> {
  let ticket = state.tickets.update_ticket_status(id, &body.status).await?;
  Ok(Json(json!({ "success": true, "ticket": ticket })))
}

#[derive(Debug, Deserialize)]
pub struct PriorityBody {
  pub priority: String,
}

/// `PUT /tickets/{id}/priority`
pub async fn update_priority<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<PriorityBody>,
) -> Result<impl IntoResponse, ApiError> {
  let ticket = state
    .tickets
    .update_ticket_priority(id, &body.priority)
    .await?;
  Ok(Json(json!({ "success": true, "ticket": ticket })))
}

#[derive(Debug, Deserialize)]
pub struct AssigneeBody {
  /// Kept as a string so an empty value can mean "unassign".
  #[serde(default)]
  pub assignee_id: Option<String>,
}

/// `PUT /tickets/{id}/assignee`
pub async fn update_assignee<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<AssigneeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let assignee = parse_assignee(body.assignee_id.as_deref())?;
  let ticket = state.tickets.assign_ticket(id, assignee).await?;
  Ok(Json(json!({ "success": true, "ticket": ticket })))
}

fn parse_assignee(raw: Option<&str>) -> Result<Option<Uuid>, Error> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => Uuid::parse_str(s)
      .map(Some)
      .map_err(|_| Error::validation(format!("invalid assignee_id: {s}"))),
  }
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
  pub author_id:   Uuid,
  pub content:     String,
  #[serde(default)]
  pub is_internal: bool,
}

/// `POST /tickets/{id}/replies`. Returns 201 with the stored message and
/// what happened to the customer notification.
pub async fn reply<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<ReplyBody>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state
    .tickets
    .add_admin_reply(id, body.author_id, &body.content, body.is_internal)
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success":      true,
      "message":      outcome.message,
      "notification": outcome.notification,
    })),
  ))
}
