//! Subscription renewal: eligibility, pricing, and the expiration sweep.

use chrono::{Months, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  service::persistence,
  store::SubscriptionStore,
  subscription::{
    NewSubscription, Renewal, RenewalQuote, Subscription, SubscriptionStatus,
  },
};

/// How many days before `end_date` a subscription becomes renewable when no
/// window is configured.
pub const DEFAULT_RENEWAL_WINDOW_DAYS: i64 = 30;

/// `end_date` pushed forward by whole calendar months, clamped to the last
/// day of the target month (Jan 31 + 1 month = Feb 28/29).
pub fn renewal_end_date(end_date: NaiveDate, months: u32) -> Option<NaiveDate> {
  end_date.checked_add_months(Months::new(months))
}

/// The discounted price when present and positive, otherwise the list price.
pub fn renewal_amount(mrp_cents: i64, discounted_price_cents: Option<i64>) -> i64 {
  match discounted_price_cents {
    Some(discounted) if discounted > 0 => discounted,
    _ => mrp_cents,
  }
}

pub struct RenewalService<S> {
  store:       S,
  window_days: i64,
}

impl<S: SubscriptionStore> RenewalService<S> {
  pub fn new(store: S) -> Self {
    Self { store, window_days: DEFAULT_RENEWAL_WINDOW_DAYS }
  }

  pub fn with_window_days(mut self, days: i64) -> Self {
    self.window_days = days;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Validate and persist a new `ACTIVE` subscription.
  pub async fn create_subscription(
    &self,
    data: NewSubscription,
  ) -> Result<Subscription> {
    let data = data.validated()?;
    let subscription = self
      .store
      .create_subscription(data)
      .await
      .map_err(persistence)?;
    info!(
      subscription_id = %subscription.subscription_id,
      customer_id = %subscription.customer_id,
      end_date = %subscription.end_date,
      "subscription created"
    );
    Ok(subscription)
  }

  /// Cancelled subscriptions never renew. Others renew once they are within
  /// the window of their end date, including after they have lapsed.
  pub fn is_eligible_for_renewal(
    &self,
    subscription: &Subscription,
    today: NaiveDate,
  ) -> bool {
    subscription.status != SubscriptionStatus::Cancelled
      && (subscription.end_date - today).num_days() <= self.window_days
  }

  pub fn quote(&self, subscription: &Subscription) -> Result<RenewalQuote> {
    let new_end_date = renewal_end_date(
      subscription.end_date,
      subscription.billing_period_months,
    )
    .ok_or_else(|| Error::validation("renewal end date is out of range"))?;

    Ok(RenewalQuote {
      new_end_date,
      amount_cents: renewal_amount(
        subscription.mrp_cents,
        subscription.discounted_price_cents,
      ),
    })
  }

  /// Fetch a subscription, scoped to `customer_id` when one is given.
  pub async fn get_subscription(
    &self,
    subscription_id: Uuid,
    customer_id: Option<Uuid>,
  ) -> Result<Subscription> {
    self
      .store
      .get_subscription(subscription_id)
      .await
      .map_err(persistence)?
      .filter(|s| customer_id.is_none_or(|c| s.customer_id == c))
      .ok_or(Error::SubscriptionNotFound(subscription_id))
  }

  /// Extend the subscription by one billing period and record the renewal.
  pub async fn renew(
    &self,
    subscription_id: Uuid,
    customer_id: Option<Uuid>,
    today: NaiveDate,
  ) -> Result<Renewal> {
    let subscription = self.get_subscription(subscription_id, customer_id).await?;

    if !self.is_eligible_for_renewal(&subscription, today) {
      return Err(Error::NotEligible(subscription_id));
    }

    let quote = self.quote(&subscription)?;
    let renewal = Renewal {
      renewal_id:        Uuid::new_v4(),
      subscription_id,
      previous_end_date: subscription.end_date,
      new_end_date:      quote.new_end_date,
      amount_cents:      quote.amount_cents,
      renewed_at:        Utc::now(),
    };

    // Applies only while the end date is still the one read above.
    let applied = self
      .store
      .apply_renewal(renewal.clone())
      .await
      .map_err(persistence)?;
    if !applied {
      warn!(%subscription_id, "renewal lost to a concurrent change");
      return Err(Error::NotEligible(subscription_id));
    }

    info!(
      %subscription_id,
      new_end_date = %renewal.new_end_date,
      amount_cents = renewal.amount_cents,
      "subscription renewed"
    );
    Ok(renewal)
  }

  pub async fn list_customer_subscriptions(
    &self,
    customer_id: Uuid,
  ) -> Result<Vec<Subscription>> {
    self
      .store
      .list_subscriptions(Some(customer_id))
      .await
      .map_err(persistence)
  }

  pub async fn renewal_history(&self, subscription_id: Uuid) -> Result<Vec<Renewal>> {
    self
      .store
      .list_renewals(subscription_id)
      .await
      .map_err(persistence)
  }

  /// The periodic expiration job. Runs to completion in one statement.
  pub async fn expire_subscriptions(&self, today: NaiveDate) -> Result<u64> {
    let expired = self.store.expire_lapsed(today).await.map_err(persistence)?;
    info!(%today, expired, "subscription expiration sweep finished");
    Ok(expired)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn month_end_clamps_in_leap_year() {
    assert_eq!(renewal_end_date(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
    assert_eq!(renewal_end_date(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
  }

  #[test]
  fn multi_month_periods() {
    assert_eq!(renewal_end_date(date(2024, 3, 15), 3), Some(date(2024, 6, 15)));
    assert_eq!(renewal_end_date(date(2024, 8, 31), 6), Some(date(2025, 2, 28)));
    assert_eq!(renewal_end_date(date(2024, 2, 29), 12), Some(date(2025, 2, 28)));
  }

  #[test]
  fn amount_prefers_positive_discount() {
    assert_eq!(renewal_amount(10_000, Some(7_500)), 7_500);
    assert_eq!(renewal_amount(10_000, Some(0)), 10_000);
    assert_eq!(renewal_amount(10_000, Some(-1)), 10_000);
    assert_eq!(renewal_amount(10_000, None), 10_000);
  }
}
