//! Router tests against an in-memory `SqliteStore`.

use std::sync::{Arc, Mutex};

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::{Days, NaiveDate, Utc};
use desk_core::{
  notify::{Notifier, NotifyError},
  renewal::renewal_end_date,
  store::SubscriptionStore,
  subscription::{NewSubscription, Subscription},
};
use desk_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiState, admin_router, portal_router};

#[derive(Clone, Default)]
struct RecordingNotifier {
  sent: Arc<Mutex<Vec<Uuid>>>,
}

impl Notifier for RecordingNotifier {
  async fn notify(&self, _: Uuid, ticket_id: Uuid, _: &str) -> Result<(), NotifyError> {
    self.sent.lock().unwrap().push(ticket_id);
    Ok(())
  }
}

struct Harness {
  admin:    Router,
  portal:   Router,
  store:    SqliteStore,
  notifier: RecordingNotifier,
}

async fn harness() -> Harness {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let notifier = RecordingNotifier::default();
  let state = ApiState::new(store.clone(), notifier.clone(), 30);
  Harness {
    admin: admin_router(state.clone()),
    portal: portal_router(state),
    store,
    notifier,
  }
}

async fn send(
  router: &Router,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

/// Open a ticket through the portal and return its id.
async fn open_ticket(h: &Harness, customer: Uuid) -> String {
  let (status, body) = send(
    &h.portal,
    Method::POST,
    &format!("/customers/{customer}/tickets"),
    Some(json!({
      "subject":  "Login issue",
      "category": "Technical",
      "priority": "HIGH",
      "message":  "The login page loops back to itself.",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["ticket"]["ticket_id"].as_str().unwrap().to_owned()
}

async fn subscription(h: &Harness, customer: Uuid, end_date: NaiveDate) -> Subscription {
  h.store
    .create_subscription(NewSubscription {
      customer_id:            customer,
      plan_name:              "Pro".into(),
      billing_period_months:  1,
      mrp_cents:              9_900,
      discounted_price_cents: Some(7_900),
      start_date:             end_date - Days::new(30),
      end_date,
    })
    .await
    .unwrap()
}

fn today() -> NaiveDate { Utc::now().date_naive() }

// ── Ticket lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn portal_creates_open_ticket_with_priority_verbatim() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let id = open_ticket(&h, customer).await;

  let (status, body) = send(&h.admin, Method::GET, &format!("/tickets/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ticket"]["status"], "OPEN");
  assert_eq!(body["ticket"]["priority"], "HIGH");
  assert_eq!(body["ticket"]["subject"], "Login issue");
  assert_eq!(body["ticket"]["created_at"], body["ticket"]["updated_at"]);
  assert_eq!(body["messages"].as_array().unwrap().len(), 1);

  let (_, page) = send(&h.admin, Method::GET, "/tickets?status=OPEN", None).await;
  assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn portal_create_validation_errors() {
  let h = harness().await;
  let uri = format!("/customers/{}/tickets", Uuid::new_v4());

  let (status, body) = send(
    &h.portal,
    Method::POST,
    &uri,
    Some(json!({ "subject": " ", "category": "Technical" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "validation_failed");

  let (status, _) = send(
    &h.portal,
    Method::POST,
    &uri,
    Some(json!({ "subject": "Help", "category": "General", "priority": "CRITICAL" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, body) = send(&h.portal, Method::POST, &uri, Some(json!({ "subject": 7 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn invalid_status_leaves_ticket_unchanged() {
  let h = harness().await;
  let id = open_ticket(&h, Uuid::new_v4()).await;

  let (status, body) = send(
    &h.admin,
    Method::PUT,
    &format!("/tickets/{id}/status"),
    Some(json!({ "status": "ARCHIVED" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["error"], "validation_failed");

  let (_, body) = send(&h.admin, Method::GET, &format!("/tickets/{id}"), None).await;
  assert_eq!(body["ticket"]["status"], "OPEN");

  let (status, body) = send(
    &h.admin,
    Method::PUT,
    &format!("/tickets/{id}/status"),
    Some(json!({ "status": "IN_PROGRESS" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["ticket"]["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn priority_update() {
  let h = harness().await;
  let id = open_ticket(&h, Uuid::new_v4()).await;

  let (status, body) = send(
    &h.admin,
    Method::PUT,
    &format!("/tickets/{id}/priority"),
    Some(json!({ "priority": "URGENT" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ticket"]["priority"], "URGENT");
}

#[tokio::test]
async fn empty_assignee_clears_assignment() {
  let h = harness().await;
  let id = open_ticket(&h, Uuid::new_v4()).await;
  let agent = Uuid::new_v4();
  let uri = format!("/tickets/{id}/assignee");

  let (_, body) = send(
    &h.admin,
    Method::PUT,
    &uri,
    Some(json!({ "assignee_id": agent.to_string() })),
  )
  .await;
  assert_eq!(body["ticket"]["assignee_id"], agent.to_string());

  let (status, body) =
    send(&h.admin, Method::PUT, &uri, Some(json!({ "assignee_id": "" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["ticket"]["assignee_id"].is_null());

  send(&h.admin, Method::PUT, &uri, Some(json!({ "assignee_id": agent.to_string() }))).await;
  let (_, body) = send(&h.admin, Method::PUT, &uri, Some(json!({ "assignee_id": null }))).await;
  assert!(body["ticket"]["assignee_id"].is_null());
}

// ── Messaging ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn internal_notes_stay_out_of_the_portal() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let id = open_ticket(&h, customer).await;
  let admin = Uuid::new_v4();

  let (status, body) = send(
    &h.admin,
    Method::POST,
    &format!("/tickets/{id}/replies"),
    Some(json!({ "author_id": admin, "content": "Looks like the SSO bug", "is_internal": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["notification"]["status"], "skipped");

  let (_, body) = send(
    &h.admin,
    Method::POST,
    &format!("/tickets/{id}/replies"),
    Some(json!({ "author_id": admin, "content": "We have deployed a fix." })),
  )
  .await;
  assert_eq!(body["notification"]["status"], "sent");
  assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);

  let (status, body) = send(
    &h.portal,
    Method::GET,
    &format!("/customers/{customer}/tickets/{id}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let messages = body["messages"].as_array().unwrap();
  assert_eq!(messages.len(), 2);
  assert!(messages.iter().all(|m| m["is_internal"] == false));

  let (_, body) = send(&h.admin, Method::GET, &format!("/tickets/{id}"), None).await;
  assert_eq!(body["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn closed_ticket_rejects_replies() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let id = open_ticket(&h, customer).await;

  send(
    &h.admin,
    Method::PUT,
    &format!("/tickets/{id}/status"),
    Some(json!({ "status": "CLOSED" })),
  )
  .await;

  let (status, body) = send(
    &h.admin,
    Method::POST,
    &format!("/tickets/{id}/replies"),
    Some(json!({ "author_id": Uuid::new_v4(), "content": "Anything else?" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["message"], "Cannot reply to a closed ticket");

  let (status, body) = send(
    &h.portal,
    Method::POST,
    &format!("/customers/{customer}/tickets/{id}/replies"),
    Some(json!({ "content": "One more thing" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["message"], "Cannot reply to a closed ticket");
}

#[tokio::test]
async fn customers_cannot_see_each_others_tickets() {
  let h = harness().await;
  let alice = Uuid::new_v4();
  let mallory = Uuid::new_v4();
  let id = open_ticket(&h, alice).await;

  let (status, body) = send(
    &h.portal,
    Method::GET,
    &format!("/customers/{mallory}/tickets/{id}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "not_found");

  let (status, _) = send(
    &h.portal,
    Method::POST,
    &format!("/customers/{mallory}/tickets/{id}/replies"),
    Some(json!({ "content": "hi" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, page) = send(
    &h.portal,
    Method::GET,
    &format!("/customers/{mallory}/tickets"),
    None,
  )
  .await;
  assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn malformed_path_is_bad_request() {
  let h = harness().await;
  let (status, body) = send(&h.admin, Method::GET, "/tickets/not-a-uuid", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);

  let (status, _) = send(&h.admin, Method::GET, &format!("/tickets/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_rejects_unknown_status_filter() {
  let h = harness().await;
  let (status, _) = send(&h.admin, Method::GET, "/tickets?status=DONE", None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, page) = send(&h.admin, Method::GET, "/tickets?status=&limit=500", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["limit"], crate::MAX_PAGE_SIZE);
}

#[tokio::test]
async fn empty_id_filters_are_ignored() {
  let h = harness().await;
  open_ticket(&h, Uuid::new_v4()).await;

  let (status, page) =
    send(&h.admin, Method::GET, "/tickets?assignee_id=&customer_id=", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["tickets"].as_array().map(Vec::len), Some(1));

  let (status, body) = send(&h.admin, Method::GET, "/tickets?assignee_id=bob", None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["error"], "validation_failed");
}

// ── Subscriptions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn portal_quotes_and_renews() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let end = today() + Days::new(10);
  let sub = subscription(&h, customer, end).await;
  let uri = format!("/customers/{customer}/subscriptions/{}/renewal", sub.subscription_id);
  let expected_end = renewal_end_date(end, 1).unwrap().to_string();

  let (status, body) = send(&h.portal, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["eligible"], true);
  assert_eq!(body["quote"]["amount_cents"], 7_900);
  assert_eq!(body["quote"]["new_end_date"], expected_end);

  let (status, body) = send(&h.portal, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["renewal"]["new_end_date"], expected_end);

  let (_, subs) = send(
    &h.portal,
    Method::GET,
    &format!("/customers/{customer}/subscriptions"),
    None,
  )
  .await;
  assert_eq!(subs[0]["end_date"], expected_end);

  let (_, history) = send(
    &h.admin,
    Method::GET,
    &format!("/subscriptions/{}/renewals", sub.subscription_id),
    None,
  )
  .await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn renewal_outside_window_is_rejected() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let sub = subscription(&h, customer, today() + Days::new(120)).await;
  let uri = format!("/customers/{customer}/subscriptions/{}/renewal", sub.subscription_id);

  let (_, body) = send(&h.portal, Method::GET, &uri, None).await;
  assert_eq!(body["eligible"], false);

  let (status, body) = send(&h.portal, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["error"], "validation_failed");

  let (status, _) = send(
    &h.portal,
    Method::GET,
    &format!("/customers/{}/subscriptions/{}/renewal", Uuid::new_v4(), sub.subscription_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_expire_sweep() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let lapsed = subscription(&h, customer, today() - Days::new(3)).await;
  subscription(&h, customer, today() + Days::new(3)).await;

  let (status, body) = send(&h.admin, Method::POST, "/subscriptions/expire", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["expired"], 1);

  let stored = h.store.get_subscription(lapsed.subscription_id).await.unwrap().unwrap();
  assert_eq!(stored.status.as_ref(), "EXPIRED");

  let (status, _) = send(
    &h.admin,
    Method::POST,
    &format!("/subscriptions/{}/renew", lapsed.subscription_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn ticket_can_reference_own_subscription_only() {
  let h = harness().await;
  let customer = Uuid::new_v4();
  let sub = subscription(&h, Uuid::new_v4(), today()).await;

  let (status, _) = send(
    &h.portal,
    Method::POST,
    &format!("/customers/{customer}/tickets"),
    Some(json!({
      "subject":         "Invoice",
      "category":        "Billing",
      "subscription_id": sub.subscription_id,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
