//! Notifier implementations wired up by the server.
//!
//! Without a webhook URL configured, replies are only logged.

use std::time::Duration;

use desk_core::notify::{LogNotifier, Notifier, NotifyError};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body POSTed to the webhook.
#[derive(Debug, Serialize)]
struct ReplyPayload<'a> {
  event:       &'static str,
  customer_id: Uuid,
  ticket_id:   Uuid,
  content:     &'a str,
}

/// POSTs each reply to an external endpoint (mailer, chat bridge, ...).
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl Notifier for WebhookNotifier {
  async fn notify(
    &self,
    customer_id: Uuid,
    ticket_id: Uuid,
    content: &str,
  ) -> Result<(), NotifyError> {
    let payload = ReplyPayload {
      event: "ticket.reply",
      customer_id,
      ticket_id,
      content,
    };
    self
      .client
      .post(&self.url)
      .json(&payload)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| NotifyError(e.to_string()))?;
    Ok(())
  }
}

/// The notifier chosen by configuration.
#[derive(Clone)]
pub enum ServerNotifier {
  Log(LogNotifier),
  Webhook(WebhookNotifier),
}

impl ServerNotifier {
  pub fn from_webhook_url(url: Option<&str>) -> reqwest::Result<Self> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
      Some(url) => Ok(Self::Webhook(WebhookNotifier::new(url)?)),
      None => Ok(Self::Log(LogNotifier)),
    }
  }
}

impl Notifier for ServerNotifier {
  async fn notify(
    &self,
    customer_id: Uuid,
    ticket_id: Uuid,
    content: &str,
  ) -> Result<(), NotifyError> {
    match self {
      Self::Log(n) => n.notify(customer_id, ticket_id, content).await,
      Self::Webhook(n) => n.notify(customer_id, ticket_id, content).await,
    }
  }
}
