//! HTTP server for desk.
//!
//! Mounts the staff API under `/api/admin` behind Basic auth and the customer
//! portal under `/api/portal`, over any backend implementing the desk store
//! traits.

pub mod auth;
pub mod error;
pub mod notify;

pub use error::Error;

use std::{path::Path, path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use desk_api::{ApiState, DeskStore};
use desk_core::{notify::Notifier, renewal::DEFAULT_RENEWAL_WINDOW_DAYS};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_admin};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `DESK_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  pub admin_password_hash: String,
  #[serde(default = "default_renewal_window_days")]
  pub renewal_window_days: i64,
  /// Where reply notifications are POSTed. Unset means log only.
  #[serde(default)]
  pub notify_webhook_url:  Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_renewal_window_days() -> i64 { DEFAULT_RENEWAL_WINDOW_DAYS }

impl ServerConfig {
  /// Layer `path` (optional) under `DESK_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DESK"))
      .build()?
      .try_deserialize()
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: self.admin_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, N>(state: ApiState<S, N>, auth: AuthConfig) -> Router
where
  S: DeskStore,
  N: Notifier + 'static,
{
  let admin = desk_api::admin_router(state.clone())
    .layer(middleware::from_fn_with_state(Arc::new(auth), require_admin));

  Router::new()
    .nest("/api/admin", admin)
    .nest("/api/portal", desk_api::portal_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use config::{FileFormat, File};
  use desk_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::Value;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use desk_core::notify::LogNotifier;

  async fn make_app(password: &str) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let auth = AuthConfig {
      username:      "admin".to_string(),
      password_hash: hash,
    };
    router(ApiState::new(store, LogNotifier, 30), auth)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    app:     Router,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_requires_credentials() {
    let app  = make_app("secret").await;
    let resp = oneshot_raw(app, "GET", "/api/admin/tickets", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    let body = json_body(resp).await;
    assert_eq!(body["error"], "unauthorized");
  }

  #[tokio::test]
  async fn admin_rejects_wrong_password() {
    let app  = make_app("secret").await;
    let auth = auth_header("admin", "hunter2");
    let resp = oneshot_raw(
      app,
      "GET",
      "/api/admin/tickets",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn admin_accepts_valid_credentials() {
    let app  = make_app("secret").await;
    let auth = auth_header("admin", "secret");
    let resp = oneshot_raw(
      app,
      "GET",
      "/api/admin/tickets",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["total"], 0);
  }

  // ── Portal ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn portal_is_open_and_admin_sees_its_tickets() {
    let app      = make_app("secret").await;
    let customer = Uuid::new_v4();
    let resp     = oneshot_raw(
      app.clone(),
      "POST",
      &format!("/api/portal/customers/{customer}/tickets"),
      vec![(header::CONTENT_TYPE, "application/json")],
      r#"{"subject":"Login issue","category":"Technical","priority":"HIGH"}"#,
    ).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let auth = auth_header("admin", "secret");
    let resp = oneshot_raw(
      app,
      "GET",
      &format!("/api/admin/tickets?customer_id={customer}"),
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    ).await;
    let body = json_body(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["tickets"][0]["priority"], "HIGH");
  }

  #[tokio::test]
  async fn unknown_route_is_404() {
    let app  = make_app("secret").await;
    let resp = oneshot_raw(app, "GET", "/api/nope", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Configuration ────────────────────────────────────────────────────────────

  #[test]
  fn config_defaults() {
    let toml = r#"
      store_path          = "~/.local/share/desk/desk.db"
      admin_username      = "admin"
      admin_password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
    "#;
    let cfg: ServerConfig = config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.renewal_window_days, 30);
    assert!(cfg.notify_webhook_url.is_none());
    assert_eq!(cfg.auth().username, "admin");
  }
}
