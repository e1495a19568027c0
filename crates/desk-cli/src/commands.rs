//! Maintenance operations run directly against the store.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use desk_core::{
  RenewalService, TicketService,
  notify::LogNotifier,
  subscription::{NewSubscription, Renewal},
  ticket::{NewTicket, TicketPriority},
};
use desk_store_sqlite::SqliteStore;
use uuid::Uuid;

/// Ids created by [`seed`].
#[derive(Debug)]
pub struct Seeded {
  pub customer_id:     Uuid,
  pub subscription_id: Uuid,
  pub ticket_id:       Uuid,
}

/// One subscription close to renewal and one open ticket with a short thread.
pub async fn seed(
  store: &SqliteStore,
  customer_id: Uuid,
  today: NaiveDate,
) -> Result<Seeded> {
  let renewals = RenewalService::new(store.clone());
  let tickets = TicketService::new(store.clone(), LogNotifier);

  let end_date = today
    .checked_add_days(Days::new(7))
    .context("seed end date out of range")?;
  let start_date = end_date
    .checked_sub_months(chrono::Months::new(1))
    .context("seed start date out of range")?;

  let subscription = renewals
    .create_subscription(NewSubscription {
      customer_id,
      plan_name: "Pro (monthly)".into(),
      billing_period_months: 1,
      mrp_cents: 4_900,
      discounted_price_cents: Some(3_900),
      start_date,
      end_date,
    })
    .await
    .context("creating subscription")?;

  let mut input = NewTicket::new(customer_id, "Login issue", "Technical");
  input.priority = TicketPriority::High;
  input.subscription_id = Some(subscription.subscription_id);
  input.message = Some("I get sent back to the login page after signing in.".into());
  let ticket = tickets
    .create_ticket(input)
    .await
    .context("creating ticket")?;

  let staff = Uuid::new_v4();
  tickets
    .add_admin_reply(
      ticket.ticket_id,
      staff,
      "Cookie domain changed in the last deploy.",
      true,
    )
    .await
    .context("adding internal note")?;
  tickets
    .add_admin_reply(
      ticket.ticket_id,
      staff,
      "Thanks for the report, we are looking into it.",
      false,
    )
    .await
    .context("adding reply")?;

  Ok(Seeded {
    customer_id,
    subscription_id: subscription.subscription_id,
    ticket_id: ticket.ticket_id,
  })
}

pub async fn expire_subscriptions(store: &SqliteStore, today: NaiveDate) -> Result<u64> {
  RenewalService::new(store.clone())
    .expire_subscriptions(today)
    .await
    .context("expiring subscriptions")
}

/// Renew on behalf of staff: eligibility still applies, ownership does not.
pub async fn renew(
  store: &SqliteStore,
  subscription_id: Uuid,
  window_days: i64,
  today: NaiveDate,
) -> Result<Renewal> {
  RenewalService::new(store.clone())
    .with_window_days(window_days)
    .renew(subscription_id, None, today)
    .await
    .with_context(|| format!("renewing subscription {subscription_id}"))
}
