//! [`SubscriptionStore`] for [`SqliteStore`].

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use desk_core::{
  store::SubscriptionStore,
  subscription::{NewSubscription, Renewal, Subscription, SubscriptionStatus},
};

use crate::{
  Result, SqliteStore,
  encode::{
    RENEWAL_COLUMNS, RawRenewal, RawSubscription, SUBSCRIPTION_COLUMNS, encode_date,
    encode_dt, encode_uuid, now,
  },
};

impl SubscriptionStore for SqliteStore {
  async fn create_subscription(&self, input: NewSubscription) -> Result<Subscription> {
    let created_at = now();
    let subscription = Subscription {
      subscription_id:        Uuid::new_v4(),
      customer_id:            input.customer_id,
      plan_name:              input.plan_name,
      billing_period_months:  input.billing_period_months,
      mrp_cents:              input.mrp_cents,
      discounted_price_cents: input.discounted_price_cents,
      start_date:             input.start_date,
      end_date:               input.end_date,
      status:                 SubscriptionStatus::Active,
      created_at,
      updated_at:             created_at,
    };

    let id_str       = encode_uuid(subscription.subscription_id);
    let customer_str = encode_uuid(subscription.customer_id);
    let plan         = subscription.plan_name.clone();
    let period       = i64::from(subscription.billing_period_months);
    let mrp          = subscription.mrp_cents;
    let discounted   = subscription.discounted_price_cents;
    let start_str    = encode_date(subscription.start_date);
    let end_str      = encode_date(subscription.end_date);
    let status_str   = subscription.status.as_ref().to_owned();
    let at_str       = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             subscription_id, customer_id, plan_name, billing_period_months,
             mrp_cents, discounted_price_cents, start_date, end_date, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            customer_str,
            plan,
            period,
            mrp,
            discounted,
            start_str,
            end_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(subscription)
  }

  async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1"
              ),
              rusqlite::params![id_str],
              RawSubscription::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn list_subscriptions(&self, customer_id: Option<Uuid>) -> Result<Vec<Subscription>> {
    let customer_str = customer_id.map(encode_uuid);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS}
           FROM subscriptions
           WHERE ?1 IS NULL OR customer_id = ?1
           ORDER BY end_date ASC, subscription_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![customer_str], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn apply_renewal(&self, renewal: Renewal) -> Result<bool> {
    let id_str        = encode_uuid(renewal.renewal_id);
    let sub_str       = encode_uuid(renewal.subscription_id);
    let prev_str      = encode_date(renewal.previous_end_date);
    let new_str       = encode_date(renewal.new_end_date);
    let amount        = renewal.amount_cents;
    let at_str        = encode_dt(renewal.renewed_at);
    let active_str    = SubscriptionStatus::Active.as_ref().to_owned();
    let cancelled_str = SubscriptionStatus::Cancelled.as_ref().to_owned();

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE subscriptions
           SET end_date = ?1, status = ?2, updated_at = ?3
           WHERE subscription_id = ?4 AND end_date = ?5 AND status <> ?6",
          rusqlite::params![
            new_str,
            active_str,
            at_str,
            sub_str,
            prev_str,
            cancelled_str
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO subscription_renewals (
             renewal_id, subscription_id, previous_end_date, new_end_date,
             amount_cents, renewed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, sub_str, prev_str, new_str, amount, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(applied)
  }

  async fn list_renewals(&self, subscription_id: Uuid) -> Result<Vec<Renewal>> {
    let sub_str = encode_uuid(subscription_id);

    let raws: Vec<RawRenewal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RENEWAL_COLUMNS}
           FROM subscription_renewals
           WHERE subscription_id = ?1
           ORDER BY renewed_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![sub_str], RawRenewal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRenewal::into_renewal).collect()
  }

  async fn expire_lapsed(&self, today: NaiveDate) -> Result<u64> {
    let today_str   = encode_date(today);
    let at_str      = encode_dt(now());
    let active_str  = SubscriptionStatus::Active.as_ref().to_owned();
    let expired_str = SubscriptionStatus::Expired.as_ref().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions
           SET status = ?1, updated_at = ?2
           WHERE status = ?3 AND end_date < ?4",
          rusqlite::params![expired_str, at_str, active_str, today_str],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }
}
