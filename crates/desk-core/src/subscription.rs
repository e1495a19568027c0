//! Customer subscriptions and their renewal history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
  #[default]
  Active,
  Expired,
  Cancelled,
}

/// Prices are in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:        Uuid,
  pub customer_id:            Uuid,
  pub plan_name:              String,
  pub billing_period_months:  u32,
  /// List price per billing period.
  pub mrp_cents:              i64,
  pub discounted_price_cents: Option<i64>,
  pub start_date:             NaiveDate,
  pub end_date:               NaiveDate,
  pub status:                 SubscriptionStatus,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
}

/// Input to [`crate::store::SubscriptionStore::create_subscription`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
  pub customer_id:            Uuid,
  pub plan_name:              String,
  pub billing_period_months:  u32,
  pub mrp_cents:              i64,
  #[serde(default)]
  pub discounted_price_cents: Option<i64>,
  pub start_date:             NaiveDate,
  pub end_date:               NaiveDate,
}

impl NewSubscription {
  pub fn validated(self) -> Result<Self> {
    if self.plan_name.trim().is_empty() {
      return Err(Error::validation("plan name is required"));
    }
    if self.billing_period_months == 0 {
      return Err(Error::validation("billing period must be at least one month"));
    }
    if self.mrp_cents < 0 {
      return Err(Error::validation("price cannot be negative"));
    }
    if self.end_date < self.start_date {
      return Err(Error::validation("end date precedes start date"));
    }
    Ok(self)
  }
}

/// A renewal that has been applied to a subscription. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renewal {
  pub renewal_id:        Uuid,
  pub subscription_id:   Uuid,
  pub previous_end_date: NaiveDate,
  pub new_end_date:      NaiveDate,
  pub amount_cents:      i64,
  pub renewed_at:        DateTime<Utc>,
}

/// The outcome of renewing now, without applying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalQuote {
  pub new_end_date: NaiveDate,
  pub amount_cents: i64,
}
