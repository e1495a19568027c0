//! Staff handlers for `/subscriptions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/subscriptions/expire` | Runs the expiration sweep for today |
//! | `GET`  | `/subscriptions/{id}/renewals` | Renewal history, oldest first |
//! | `POST` | `/subscriptions/{id}/renew` | Renew without an ownership check |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use desk_core::{notify::Notifier, subscription::Renewal};
use serde_json::json;
use uuid::Uuid;

use crate::{ApiState, DeskStore, error::ApiError, extract::ApiPath};

/// `POST /subscriptions/expire`
pub async fn expire<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
) -> Result<impl IntoResponse, ApiError> {
  let today = Utc::now().date_naive();
  let expired = state.renewals.expire_subscriptions(today).await?;
  Ok(Json(json!({ "success": true, "expired": expired })))
}

/// `GET /subscriptions/{id}/renewals`
pub async fn history<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Renewal>>, ApiError> {
  state.renewals.get_subscription(id, None).await?;
  Ok(Json(state.renewals.renewal_history(id).await?))
}

/// `POST /subscriptions/{id}/renew`
pub async fn renew<S: DeskStore, N: Notifier>(
  State(state): State<ApiState<S, N>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let today = Utc::now().date_naive();
  let renewal = state.renewals.renew(id, None, today).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "renewal": renewal })),
  ))
}
